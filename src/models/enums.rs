use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
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

str_enum!(Entity {
    Department => "Department",
    Doctor => "Doctor",
    Patient => "Patient",
    Drug => "Drug",
    Room => "Room",
    PatientDrug => "PatientDrug",
});

impl Entity {
    /// Menu order.
    pub const ALL: [Entity; 6] = [
        Self::Department,
        Self::Doctor,
        Self::Patient,
        Self::Drug,
        Self::Room,
        Self::PatientDrug,
    ];
}

str_enum!(Sex {
    Male => "male",
    Female => "female",
});

impl Sex {
    /// Stored as an integer: 1 = male, 0 = female.
    pub fn to_storage(self) -> i64 {
        match self {
            Self::Male => 1,
            Self::Female => 0,
        }
    }

    /// Any value other than 1 reads back as female.
    pub fn from_storage(value: i64) -> Self {
        if value == 1 {
            Self::Male
        } else {
            Self::Female
        }
    }
}
