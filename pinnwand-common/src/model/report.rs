use crate::model::{Id, post::PostMarker};
use serde::{Deserialize, Serialize};

/// All open reports against one post, as shown to admins.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct ReportSummary {
    pub post_id: Id<PostMarker>,
    pub report_count: u64,
    pub content: String,
    pub author_display_name: String,
}
