/// Shared types used across the codebase

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// ISO-8601 UTC timestamp with millisecond precision, the format stored in every `*_at` column
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generates `parse`/`as_str` for a closed set of lowercase status strings
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn parse(raw: &str) -> Option<Self> {
                match raw.trim() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Triage state of a contact form submission
    SubmissionStatus {
        New => "new",
        Contacted => "contacted",
        Resolved => "resolved",
    }
);

string_enum!(
    ApplicationStatus {
        New => "new",
        Reviewing => "reviewing",
        Interviewed => "interviewed",
        Rejected => "rejected",
        Hired => "hired",
    }
);

string_enum!(
    ProjectStatus {
        Planning => "planning",
        InProgress => "in_progress",
        Review => "review",
        Completed => "completed",
        OnHold => "on_hold",
    }
);

string_enum!(
    /// Staff role. Both roles may use the dashboard; admins may also manage users.
    UserRole {
        Admin => "admin",
        Editor => "editor",
    }
);
