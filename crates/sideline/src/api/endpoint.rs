use crate::feed::EmptyPageConditions;

/// The paginated lists the app shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListEndpoint {
    /// Social feed of event posts.
    EventsFeed,
    /// Open match listings.
    MatchFeed,
    /// Posts authored by the signed-in user.
    MyPosts,
    /// Matches the signed-in user created or joined.
    MyMatches,
    /// Groups the signed-in user belongs to.
    Groups,
    /// Pending membership requests for one group.
    PendingRequests { group_id: String },
}

impl ListEndpoint {
    /// Short name used as the feed label in events and logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ListEndpoint::EventsFeed => "events",
            ListEndpoint::MatchFeed => "matches",
            ListEndpoint::MyPosts => "my-posts",
            ListEndpoint::MyMatches => "my-matches",
            ListEndpoint::Groups => "groups",
            ListEndpoint::PendingRequests { .. } => "requests",
        }
    }

    /// Path relative to the API base URL.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            ListEndpoint::EventsFeed => "/posts".to_string(),
            ListEndpoint::MatchFeed => "/matches".to_string(),
            ListEndpoint::MyPosts => "/posts/me".to_string(),
            ListEndpoint::MyMatches => "/matches/me".to_string(),
            ListEndpoint::Groups => "/groups/me".to_string(),
            ListEndpoint::PendingRequests { group_id } => {
                format!("/groups/{}/requests", group_id)
            }
        }
    }

    /// Query parameters sent on every page request besides `page` and `limit`.
    #[must_use]
    pub fn extra_query(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ListEndpoint::MatchFeed => &[("status", "open")],
            ListEndpoint::PendingRequests { .. } => &[("status", "pending")],
            _ => &[],
        }
    }

    /// Statuses this endpoint uses to say "no more data".
    ///
    /// The post endpoints answer a page past the end with 400/404; the
    /// others return an empty `data` array.
    #[must_use]
    pub fn default_empty_conditions(&self) -> EmptyPageConditions {
        match self {
            ListEndpoint::EventsFeed | ListEndpoint::MyPosts => {
                EmptyPageConditions::statuses([400, 404])
            }
            ListEndpoint::PendingRequests { .. } => EmptyPageConditions::statuses([404]),
            _ => EmptyPageConditions::none(),
        }
    }
}

impl std::fmt::Display for ListEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
