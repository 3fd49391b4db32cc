use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::auth::DEFAULT_PASSWORD;

const RC_ENV_VAR: &str =
  "GREENTASKERRC";
const RC_FILE_NAME: &str =
  ".greentaskerrc";
const PREFERS_DARK_ENV_VAR: &str =
  "GREENTASKER_PREFERS_DARK";

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "data.location".to_string(),
      "~/.greentasker".to_string()
    );
    map.insert(
      "auth.password".to_string(),
      DEFAULT_PASSWORD.to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match resolve_rc_path(rc_override)?
    {
      | Some(path) => {
        info!(rc = %path.display(), "loading rc file");
        cfg.load_file(&path)?;
      }
      | None => {
        debug!(
          "no rc file found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn password(&self) -> String {
    self
      .get("auth.password")
      .unwrap_or_else(|| {
        DEFAULT_PASSWORD.to_string()
      })
  }

  /// Environment first, then `prefers.dark`, else light.
  pub fn prefers_dark(&self) -> bool {
    if let Ok(raw) =
      std::env::var(PREFERS_DARK_ENV_VAR)
    {
      trace!(value = %raw, "prefers-dark from environment");
      return parse_bool(&raw);
    }
    self
      .get_bool("prefers.dark")
      .unwrap_or(false)
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    self.parse_text(&text, &path)?;
    self.loaded_files.push(path);
    Ok(())
  }

  fn parse_text(
    &mut self,
    text: &str,
    origin: &Path
  ) -> anyhow::Result<()> {
    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = match raw_line
        .split_once('#')
      {
        | Some((before, _)) => {
          before.trim()
        }
        | None => raw_line.trim()
      };
      if line.is_empty() {
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            origin.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      if key.is_empty() {
        return Err(anyhow!(
          "empty config key at {}:{}",
          origin.display(),
          line_num + 1
        ));
      }
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  if let Some(path) = override_dir {
    return Ok(path.to_path_buf());
  }
  if let Some(cfg_value) =
    cfg.get("data.location")
  {
    return Ok(expand_tilde(Path::new(
      &cfg_value
    )));
  }
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".greentasker"))
}

/// Defaults to the system temp directory; `lock` clears it explicitly.
#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_session_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> PathBuf {
  if let Some(path) = override_dir {
    return path.to_path_buf();
  }
  match cfg.get("session.location") {
    | Some(value) => {
      expand_tilde(Path::new(&value))
    }
    | None => {
      std::env::temp_dir()
        .join("greentasker-session")
    }
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping rc file"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
