use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident, $repr:ty) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $repr);
    };
}

// The store hands out wide integers for both; never narrow them to f64.
id_newtype!(PostId, u64);
id_newtype!(Timestamp, i64);

impl Timestamp {
    /// Store timestamps are nanoseconds since the Unix epoch.
    pub fn to_utc(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }

    pub fn to_local(self) -> DateTime<Local> {
        self.to_utc().with_timezone(&Local)
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
