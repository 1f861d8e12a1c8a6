//! Status helper enums mapping to the SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data in the
//! corresponding `*_statuses` table, and its name matches the seeded `name`.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Human-readable name, as seeded in the lookup table.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Map a database status ID back to the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( v if v == $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Expression lifecycle status.
    ExpressionStatus {
        NotCalculated = 1 => "not calculated",
        Calculated = 2 => "calculated",
    }
}

define_status_enum! {
    /// Task lifecycle status. Only `Ready` rows can be claimed.
    TaskStatus {
        NotReady = 1 => "not ready",
        Ready = 2 => "ready",
        InProgress = 3 => "in progress",
        Calculated = 4 => "calculated",
    }
}
