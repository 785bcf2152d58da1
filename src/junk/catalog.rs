use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scanner::walker;

/// One measurable location inside a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    /// May start with `~`
    pub path: String,
    #[serde(default)]
    pub recommended: bool,
}

impl ItemSpec {
    pub fn resolved_path(&self) -> PathBuf {
        walker::expand_home(&self.path)
    }
}

/// A named group of junk locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
}

fn category(key: &str, name: &str, description: &str, items: &[(&str, &str, bool)]) -> CategorySpec {
    CategorySpec {
        key: key.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        items: items
            .iter()
            .map(|(name, path, recommended)| ItemSpec {
                name: name.to_string(),
                path: path.to_string(),
                recommended: *recommended,
            })
            .collect(),
    }
}

/// The built-in catalog, in display order
pub fn builtin() -> Vec<CategorySpec> {
    vec![
        category(
            "user_cache",
            "User Caches",
            "Application caches that can be safely regenerated",
            &[("User Caches", "~/Library/Caches", true)],
        ),
        category(
            "system_logs",
            "System Logs",
            "Log files from macOS and applications",
            &[
                ("User Logs", "~/Library/Logs", true),
                ("Diagnostic Reports", "~/Library/Logs/DiagnosticReports", true),
            ],
        ),
        category(
            "xcode",
            "Xcode Junk",
            "Build data, simulators, and caches from Xcode",
            &[
                ("DerivedData", "~/Library/Developer/Xcode/DerivedData", true),
                ("Archives", "~/Library/Developer/Xcode/Archives", false),
                ("iOS DeviceSupport", "~/Library/Developer/Xcode/iOS DeviceSupport", false),
                ("CoreSimulator", "~/Library/Developer/CoreSimulator/Devices", false),
                ("Xcode Caches", "~/Library/Caches/com.apple.dt.Xcode", true),
            ],
        ),
        category(
            "browser",
            "Browser Cache",
            "Temporary browser data for faster page loading",
            &[
                ("Safari Cache", "~/Library/Caches/com.apple.Safari", true),
                ("Chrome Cache", "~/Library/Caches/Google/Chrome", true),
                ("Firefox Cache", "~/Library/Caches/Firefox", true),
                ("Edge Cache", "~/Library/Caches/com.microsoft.edgemac", true),
                ("Brave Cache", "~/Library/Caches/BraveSoftware", true),
            ],
        ),
        category(
            "mail",
            "Mail Attachments",
            "Downloaded mail attachments and data",
            &[
                (
                    "Mail Downloads",
                    "~/Library/Containers/com.apple.mail/Data/Library/Mail Downloads",
                    false,
                ),
                ("Mail Data", "~/Library/Mail", false),
            ],
        ),
        category(
            "temp",
            "Temporary Files",
            "System and application temporary files",
            &[("Tmp", "/tmp", true), ("User Tmp", "~/.Trash", false)],
        ),
        category(
            "app_support",
            "Application Leftovers",
            "Support files from apps that may no longer be installed",
            &[
                ("Application Support", "~/Library/Application Support", false),
                ("Preferences", "~/Library/Preferences", false),
            ],
        ),
    ]
}

/// Built-in categories followed by any extras from config
pub fn with_extras(extra: &[CategorySpec]) -> Vec<CategorySpec> {
    let mut all = builtin();
    all.extend(extra.iter().cloned());
    all
}
