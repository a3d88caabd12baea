/// Commander identity and the ship last loaded into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommanderInfo {
    pub name: Option<String>,
    /// Frontier account id.
    pub fid: Option<String>,
    pub ship: Option<String>,
    pub ship_name: Option<String>,
    pub game_mode: Option<String>,
    pub credits: Option<i64>,
}

impl CommanderInfo {
    /// Record `name`, returning whether it differs from the known one.
    pub fn set_name(&mut self, name: &str, fid: Option<&str>) -> bool {
        let changed = self.name.as_deref() != Some(name);
        self.name = Some(name.to_string());
        if let Some(fid) = fid {
            self.fid = Some(fid.to_string());
        }
        changed
    }
}
