/// Spot report record and the SALUTE categories it carries.
///
/// SALUTE: Size, Activity, Location, Unit, Time, Equipment. Location and time are plain fields
/// on [`SpotReport`]; the other four are fixed enumerations, each with a human readable label and
/// a code sent alongside it.
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{coord::Location, Error};

//  _____
// |_   _|   _ _ __   ___  ___
//   | || | | | '_ \ / _ \/ __|
//   | || |_| | |_) |  __/\__ \
//   |_| \__, | .__/ \___||___/
//       |___/|_|

/// Category code as transmitted. Size categories are numeric, the rest are short strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryCode {
    Number(u32),
    Text(&'static str),
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryCode::Number(n) => write!(f, "{n}"),
            CategoryCode::Text(s) => f.write_str(s),
        }
    }
}

/// Defines a SALUTE category enum with `label()`, `code()`, `ALL`, `Display` (label) and
/// `FromStr` (from the code's string form).
macro_rules! salute_category {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($label:literal, $code:expr)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn code(&self) -> CategoryCode {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .find(|c| c.code().to_string() == s)
                    .copied()
                    .ok_or_else(|| {
                        Error::ParseError(format!("unknown {} code {s:?}", stringify!($name)))
                    })
            }
        }
    };
}

use CategoryCode::{Number, Text};

salute_category! {
    /// Echelon of the observed element.
    Size {
        TeamCrew => ("Team/Crew", Number(0)),
        Squad => ("Squad", Number(1)),
        Section => ("Section", Number(2)),
        Platoon => ("Platoon", Number(3)),
        Company => ("Company", Number(4)),
        Battalion => ("Battalion", Number(5)),
        Regiment => ("Regiment", Number(6)),
        Brigade => ("Brigade", Number(7)),
        Division => ("Division", Number(8)),
        Corps => ("Corps", Number(9)),
        Army => ("Army", Number(10)),
    }
}

salute_category! {
    /// What the observed element is doing.
    Activity {
        Attacking => ("Attacking", Text("A")),
        Defending => ("Defending", Text("D")),
        Moving => ("Moving", Text("M")),
        Stationary => ("Stationary", Text("S")),
        Cache => ("Cache", Text("C")),
        Evading => ("Evading", Text("E")),
    }
}

salute_category! {
    /// Branch / type of the observed unit.
    Unit {
        Unknown => ("Unknown", Text("0")),
        Infantry => ("Infantry", Text("1")),
        Armor => ("Armor", Text("2")),
        Artillery => ("Artillery", Text("3")),
        Aviation => ("Aviation", Text("4")),
        Engineer => ("Engineer", Text("5")),
        Reconnaissance => ("Reconnaissance", Text("6")),
        Logistics => ("Logistics", Text("7")),
        Irregular => ("Irregular", Text("8")),
        Civilian => ("Civilian", Text("9")),
    }
}

salute_category! {
    /// Most significant equipment observed.
    Equipment {
        None => ("None", Text("0")),
        SmallArms => ("Small Arms", Text("1")),
        CrewServedWeapon => ("Crew-Served Weapon", Text("2")),
        WheeledVehicle => ("Wheeled Vehicle", Text("3")),
        ArmoredVehicle => ("Armored Vehicle", Text("4")),
        ArtilleryPiece => ("Artillery Piece", Text("5")),
        AirDefense => ("Air Defense", Text("6")),
        Aircraft => ("Aircraft", Text("7")),
        Ied => ("IED", Text("8")),
    }
}

/// Produces message IDs for new reports.
pub trait IdGenerator {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs in braces, e.g. `{3f2504e0-4f89-41d3-9a0c-0305e82c3301}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        format!("{{{}}}", Uuid::new_v4())
    }
}

/// A single spot report. Owned by the caller; the sender never keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotReport {
    pub message_id: String,
    /// Observation time. `None` means "now" at serialization time.
    pub time: Option<DateTime<Utc>>,
    pub location: Location,
    pub size: Size,
    pub activity: Activity,
    pub unit: Unit,
    pub equipment: Equipment,
}

impl SpotReport {
    /// New report with a fresh message ID and no observation time.
    pub fn new(
        location: Location,
        size: Size,
        activity: Activity,
        unit: Unit,
        equipment: Equipment,
    ) -> Self {
        Self {
            message_id: UuidGenerator.next_id(),
            time: None,
            location,
            size,
            activity,
            unit,
            equipment,
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = id.into();
        self
    }

    /// Replace the message ID so the report is treated as a new one by listeners.
    pub fn regenerate_message_id(&mut self, ids: &dyn IdGenerator) {
        self.message_id = ids.next_id();
    }
}
