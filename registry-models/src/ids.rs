use serde::{Deserialize, Serialize};

macro_rules! monotonic_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            sqlx::Type,
        )]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

monotonic_id!(
    GlobalId,
    "Cluster-unique (per-tenant), strictly monotonic identifier of a Version."
);
monotonic_id!(
    ContentId,
    "Cluster-unique (per-tenant), strictly monotonic identifier of a Content row."
);
monotonic_id!(
    CommentId,
    "Cluster-unique (per-tenant), strictly monotonic identifier of a Comment."
);
monotonic_id!(DownloadId, "Identifier of an ephemeral single-use download token.");
