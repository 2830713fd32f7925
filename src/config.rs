use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::PathBuf,
};

use crate::labels::GestureClass;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WristThresholds {
    /// gyro.y level that arms (and completes) a flick in the positive direction
    pub right_flick_threshold: f32,
    pub left_flick_threshold: f32,
    pub flick_cooldown_ms: u64,
    /// gyro.z level for each half of a shake
    pub shake_threshold: f32,
    pub shake_expire_ms: u64,
}

impl Default for WristThresholds {
    fn default() -> Self {
        Self {
            right_flick_threshold: 500.0,
            left_flick_threshold: 250.0,
            flick_cooldown_ms: 200,
            shake_threshold: 350.0,
            shake_expire_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HandZoneThresholds {
    /// accel.y band for the Normal zone; at or below min is HandDown, at or above max is HandUp
    pub normal_zone: [f32; 2],
    /// accel.z below this means the hand is flipped
    pub inverted_threshold: f32,
}

impl Default for HandZoneThresholds {
    fn default() -> Self {
        Self {
            normal_zone: [-4.0, 4.0],
            inverted_threshold: -6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequencerMode {
    Hold,
    Click,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionSettings {
    pub mode: SequencerMode,
    pub tracked: Vec<GestureClass>,
    pub hold_ms: u64,
    pub click_ms: u64,
    pub double_click_ms: u64,
    pub click_reset_ms: u64,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            mode: SequencerMode::Hold,
            tracked: GestureClass::ALL.to_vec(),
            hold_ms: 400,
            click_ms: 400,
            double_click_ms: 500,
            click_reset_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub wrist: WristThresholds,
    #[serde(default)]
    pub hand_zone: HandZoneThresholds,
    #[serde(default)]
    pub extension: ExtensionSettings,
}

impl Profile {
    pub fn from_toml(txt: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(txt)?;
        validate_profile(&profile)?;
        Ok(profile)
    }
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

/// On-disk profile layout: `<dir>/profiles/<name>.toml` plus an `active` pointer file.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

impl ProfileStore {
    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            profiles_dir: config_dir.join("profiles"),
            active_ptr: config_dir.join("active"),
            config_dir,
        }
    }

    /// `~/.config/wristctl`
    pub fn default_location() -> Result<Self> {
        let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
        Ok(Self::at(dirs.home_dir().join(".config").join("wristctl")))
    }

    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.toml"))
    }

    pub fn load_profile(&self, name: &str) -> Result<Profile> {
        let path = self.profile_path(name);
        let txt = fs::read_to_string(&path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        Profile::from_toml(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let p = e.path();
                if p.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }
}

#[derive(Debug, Clone)]
pub struct ConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub store: ProfileStore,
}

impl ConfigState {
    pub fn load_or_install_default(store: ProfileStore) -> Result<Self> {
        fs::create_dir_all(&store.profiles_dir)?;

        let def_path = store.profile_path("default");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        if !store.active_ptr.exists() {
            let mut f = fs::File::create(&store.active_ptr)?;
            f.write_all(b"default")?;
        }

        let active_name = fs::read_to_string(&store.active_ptr)?.trim().to_string();
        let profile = store.load_profile(&active_name)?;
        info!("loaded profile '{active_name}'");

        Ok(Self {
            active_name,
            profile,
            store,
        })
    }

    /// Use `name` for this process only; the `active` pointer on disk is left alone.
    pub fn select(&mut self, name: &str) -> Result<()> {
        self.profile = self.store.load_profile(name)?;
        self.active_name = name.to_string();
        info!("using profile '{name}' for this session");
        Ok(())
    }

    /// Keeps the last good profile when the file on disk fails to load.
    pub fn reload(&mut self) -> Result<()> {
        self.profile = self.store.load_profile(&self.active_name)?;
        info!("reloaded profile '{}'", self.active_name);
        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.store.profile_path(name);
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        let profile = self.store.load_profile(name)?;
        fs::write(&self.store.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.profile = profile;
        info!("switched active profile to '{name}'");
        Ok(())
    }

    pub fn active_path(&self) -> PathBuf {
        self.store.profile_path(&self.active_name)
    }

    pub fn list_profiles(&self) -> Vec<String> {
        self.store.list_profiles()
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "active_profile": self.active_name,
            "path": self.active_path(),
            "profile": self.profile,
        })
    }
}

fn validate_profile(p: &Profile) -> Result<()> {
    let w = &p.wrist;
    for (name, v) in [
        ("wrist.right_flick_threshold", w.right_flick_threshold),
        ("wrist.left_flick_threshold", w.left_flick_threshold),
        ("wrist.shake_threshold", w.shake_threshold),
        ("hand_zone.normal_zone[0]", p.hand_zone.normal_zone[0]),
        ("hand_zone.normal_zone[1]", p.hand_zone.normal_zone[1]),
        ("hand_zone.inverted_threshold", p.hand_zone.inverted_threshold),
    ] {
        if !v.is_finite() {
            return Err(anyhow!("{name} must be a finite number"));
        }
    }
    if w.flick_cooldown_ms == 0 || w.shake_expire_ms == 0 {
        return Err(anyhow!("wrist durations must be positive"));
    }

    let [lo, hi] = p.hand_zone.normal_zone;
    if lo > hi {
        return Err(anyhow!(
            "hand_zone.normal_zone must be [min, max], got [{lo}, {hi}]"
        ));
    }

    let e = &p.extension;
    if e.hold_ms == 0 || e.click_ms == 0 || e.double_click_ms == 0 || e.click_reset_ms == 0 {
        return Err(anyhow!("extension durations must be positive"));
    }
    if e.tracked.is_empty() {
        return Err(anyhow!("extension.tracked must name at least one gesture"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_profile_is_valid() {
        let p = Profile::from_toml(default_profile_text()).unwrap();
        assert_eq!(p.wrist.right_flick_threshold, 500.0);
        assert_eq!(p.wrist.left_flick_threshold, 250.0);
        assert_eq!(p.hand_zone.normal_zone, [-4.0, 4.0]);
        assert_eq!(p.extension.mode, SequencerMode::Hold);
        assert_eq!(p.extension.tracked.len(), 3);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let p = Profile::from_toml("[wrist]\nshake_threshold = 100.0\n").unwrap();
        assert_eq!(p.wrist.shake_threshold, 100.0);
        assert_eq!(p.wrist.flick_cooldown_ms, 200);
        assert_eq!(p.hand_zone.inverted_threshold, -6.0);
        assert_eq!(p.extension.hold_ms, 400);
    }

    #[test]
    fn rejects_bad_profiles() {
        assert!(Profile::from_toml("[hand_zone]\nnormal_zone = [4.0, -4.0]\n").is_err());
        assert!(Profile::from_toml("[extension]\ntracked = []\n").is_err());
        assert!(Profile::from_toml("[extension]\nhold_ms = 0\n").is_err());
        assert!(Profile::from_toml("[wrist]\nshake_expire_ms = 0\n").is_err());
        assert!(Profile::from_toml("[extension]\nmode = \"tap\"\n").is_err());
    }

    #[test]
    fn parses_click_mode() {
        let p = Profile::from_toml(
            "[extension]\nmode = \"click\"\ntracked = [\"INDEX\"]\ndouble_click_ms = 300\n",
        )
        .unwrap();
        assert_eq!(p.extension.mode, SequencerMode::Click);
        assert_eq!(p.extension.tracked, vec![GestureClass::Index]);
        assert_eq!(p.extension.double_click_ms, 300);
    }

    #[test]
    fn installs_default_and_switches_profiles() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProfileStore::at(tmp.path());
        let mut cfg = ConfigState::load_or_install_default(store).unwrap();
        assert_eq!(cfg.active_name, "default");
        assert!(cfg.active_path().exists());

        fs::write(
            cfg.store.profile_path("fast"),
            "[meta]\nname = \"fast\"\n[wrist]\nflick_cooldown_ms = 50\n",
        )
        .unwrap();
        assert_eq!(cfg.list_profiles(), vec!["default", "fast"]);

        cfg.set_active("fast").unwrap();
        assert_eq!(cfg.profile.wrist.flick_cooldown_ms, 50);
        let ptr = fs::read_to_string(&cfg.store.active_ptr).unwrap();
        assert_eq!(ptr, "fast");

        assert!(cfg.set_active("nope").is_err());
        assert_eq!(cfg.active_name, "fast");
    }

    #[test]
    fn select_does_not_move_the_active_pointer() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = ConfigState::load_or_install_default(ProfileStore::at(tmp.path())).unwrap();
        fs::write(cfg.store.profile_path("quick"), "[extension]\nhold_ms = 150\n").unwrap();

        cfg.select("quick").unwrap();
        assert_eq!(cfg.active_name, "quick");
        assert_eq!(cfg.profile.extension.hold_ms, 150);
        assert_eq!(fs::read_to_string(&cfg.store.active_ptr).unwrap(), "default");

        assert!(cfg.select("missing").is_err());
        assert_eq!(cfg.active_name, "quick");

        // edits to the selected file are what reload picks up
        fs::write(cfg.active_path(), "[extension]\nhold_ms = 90\n").unwrap();
        cfg.reload().unwrap();
        assert_eq!(cfg.profile.extension.hold_ms, 90);
    }

    #[test]
    fn reload_keeps_last_good_profile() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = ConfigState::load_or_install_default(ProfileStore::at(tmp.path())).unwrap();
        fs::write(cfg.active_path(), "[hand_zone]\nnormal_zone = [9.0, 1.0]\n").unwrap();
        assert!(cfg.reload().is_err());
        assert_eq!(cfg.profile.hand_zone.normal_zone, [-4.0, 4.0]);
    }
}
