//! Reads and patches the game's `options.txt`, a flat list of `key:value`
//! lines.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

pub const OPTIONS_FILE: &str = "options.txt";

/// Gamma values below this leave dark scenes too dim for the color match.
pub const MIN_GAMMA: f64 = 100.0;
pub const FULL_BRIGHT_GAMMA: &str = "1000.0";

#[derive(Debug, Clone, PartialEq)]
pub struct GameOptions {
    path: PathBuf,
    lines: Vec<String>,
}

impl GameOptions {
    /// Loads `options.txt` from the game folder.
    pub fn load(game_dir: &Path) -> Result<Self> {
        if !game_dir.is_dir() {
            bail!("The directory {} does not exist.", game_dir.display());
        }
        let path = game_dir.join(OPTIONS_FILE);
        if !path.is_file() {
            bail!(
                "The directory {} does not have an \"{OPTIONS_FILE}\" file.",
                game_dir.display()
            );
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::parse(path, &contents))
    }

    pub fn parse(path: PathBuf, contents: &str) -> Self {
        Self {
            path,
            lines: contents.lines().map(str::to_owned).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw value of the first line starting with `key:`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key)
            .map(|idx| self.lines[idx][key.len() + 1..].trim())
    }

    pub fn gui_scale(&self) -> Result<u32> {
        self.parsed("guiScale")
    }

    pub fn gamma(&self) -> Result<f64> {
        self.parsed("gamma")
    }

    pub fn needs_full_bright(&self) -> Result<bool> {
        Ok(self.gamma()? < MIN_GAMMA)
    }

    /// Rewrites the `key` line in place, or appends it when absent. Every
    /// other line keeps its content and position.
    pub fn set(&mut self, key: &str, value: &str) {
        let line = format!("{key}:{value}");
        match self.position(key) {
            Some(idx) => self.lines[idx] = line,
            None => self.lines.push(line),
        }
    }

    pub fn set_full_bright(&mut self) {
        self.set("gamma", FULL_BRIGHT_GAMMA);
    }

    pub fn save(&self) -> Result<()> {
        let mut contents = self.lines.join("\n");
        contents.push('\n');
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.lines.iter().position(|line| {
            line.strip_prefix(key)
                .is_some_and(|rest| rest.starts_with(':'))
        })
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Result<T> {
        let Some(raw) = self.get(key) else {
            bail!("The \"{OPTIONS_FILE}\" file does not have a \"{key}\" property.");
        };
        raw.parse().map_err(|_| {
            anyhow::anyhow!("The \"{OPTIONS_FILE}\" file does not have a valid \"{key}\" property: {raw:?}")
        })
    }
}
