//! Key lookup in INI-format files
//!
//! Internet shortcuts are INI blocks (`[InternetShortcut]` with `URL` and
//! optionally `IconFile` keys). The section name is not trusted; the key
//! is searched in every section, global properties first.

use ini::Ini;
use std::path::Path;

/// Read one key from an INI file, returning `default` when the file is
/// missing, unparseable, or does not contain the key.
pub fn read_ini_value(path: &Path, key: &str, default: &str) -> String {
    let ini = match Ini::load_from_file(path) {
        Ok(ini) => ini,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "failed to read ini file");
            return default.to_string();
        }
    };

    for (_section, properties) in ini.iter() {
        for (name, value) in properties.iter() {
            if name.eq_ignore_ascii_case(key) {
                return value.to_string();
            }
        }
    }

    default.to_string()
}
