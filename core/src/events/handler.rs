use super::JournalSignal;

/// Receives the signals emitted while a session processes journal events.
pub trait SignalHandler {
    fn handle_signal(&mut self, signal: &JournalSignal);

    /// Called once per processed event or batch, in emission order.
    fn handle_signals(&mut self, signals: &[JournalSignal]) {
        for signal in signals {
            self.handle_signal(signal);
        }
    }
}
