use std::sync::Arc;

use starlog_core::context::{ConfyStore, JournalFolder};
use starlog_core::system::ScanClass;
use starlog_core::{JournalSession, JournalSignal, LogTailer, SignalHandler};
use starlog_types::DisplayContext;

use crate::commands::{self, Options};

/// Prints signals as they arrive.
struct ConsolePrinter {
    ctx: DisplayContext,
}

impl SignalHandler for ConsolePrinter {
    fn handle_signal(&mut self, signal: &JournalSignal) {
        match signal {
            JournalSignal::SystemEntered { system_name, .. } => {
                println!("Entered {system_name}");
            }
            JournalSignal::BodyScanned {
                body_name, class, ..
            } => {
                let label = match class {
                    ScanClass::Star => "star",
                    ScanClass::Planet => "planet",
                    ScanClass::Ring => "ring",
                    ScanClass::BeltCluster => "belt cluster",
                };
                println!("Scanned {label} {body_name}");
            }
            JournalSignal::SignalDiscovered { name, .. } => {
                println!("Signal {name}");
            }
            JournalSignal::AllBodiesFound { count, .. } => {
                println!("All {count} bodies found");
            }
            JournalSignal::SystemMapRebuilt { tree, .. } => {
                print!("{}", tree.outline(&self.ctx));
            }
            JournalSignal::GameShutdown { .. } => println!("Game shut down"),
            _ => {}
        }
    }
}

/// Tail the journal directory until interrupted.
pub async fn watch(store: Arc<ConfyStore>, options: &Options, seed: bool) -> Result<(), String> {
    let config = store.config();
    let directory = commands::journal_directory(&store, options)?;

    let (mut tailer, mut messages) =
        LogTailer::new(store.clone(), Arc::new(JournalFolder), config.tailer.clone());
    tailer.configure(&directory).map_err(|e| e.to_string())?;

    let mut session = JournalSession::new(config.tailer.clone());
    if seed {
        let history = commands::history(&config, &directory);
        match session.seed_from_history(&history).await {
            Ok(count) => println!("Replayed {count} events from the latest session"),
            Err(e) => tracing::warn!(error = %e, "Could not replay journal history"),
        }
        if let Some(tree) = session.system_tree() {
            print!("{}", tree.outline(&options.display(&config)));
        }
    }
    session.add_signal_handler(Box::new(ConsolePrinter {
        ctx: options.display(&config),
    }));

    tailer.start().map_err(|e| e.to_string())?;
    println!("Watching journal directory: {}", directory.display());

    loop {
        tokio::select! {
            message = messages.recv() => match message {
                Some(message) => session.handle_tailer_message(message),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tailer.stop();
    Ok(())
}
