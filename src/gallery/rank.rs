use std::cmp::Ordering;

use crate::catalog::models::VideoEntry;
use crate::likes::LikeMap;
use crate::natural;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBadge {
    First,
    Second,
    Third,
}

impl RankBadge {
    fn for_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(RankBadge::First),
            1 => Some(RankBadge::Second),
            2 => Some(RankBadge::Third),
            _ => None,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            RankBadge::First => "rank-1",
            RankBadge::Second => "rank-2",
            RankBadge::Third => "rank-3",
        }
    }

    pub fn medal(self) -> &'static str {
        match self {
            RankBadge::First => "🥇",
            RankBadge::Second => "🥈",
            RankBadge::Third => "🥉",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankedVideo<'a> {
    pub video: &'a VideoEntry,
    pub likes: u64,
    pub badge: Option<RankBadge>,
}

/// Display order for one category: most liked first, ties by natural title order.
/// The top three get a badge, but only once they have at least one like.
pub fn rank<'a>(videos: &'a [VideoEntry], likes: &LikeMap) -> Vec<RankedVideo<'a>> {
    let mut ranked: Vec<RankedVideo<'a>> = videos
        .iter()
        .map(|video| RankedVideo {
            video,
            likes: likes.get(&video.url).copied().unwrap_or(0),
            badge: None,
        })
        .collect();

    ranked.sort_by(compare);

    for (position, entry) in ranked.iter_mut().enumerate() {
        if entry.likes > 0 {
            entry.badge = RankBadge::for_position(position);
        }
    }

    ranked
}

fn compare(a: &RankedVideo<'_>, b: &RankedVideo<'_>) -> Ordering {
    b.likes
        .cmp(&a.likes)
        .then_with(|| natural::compare_ignore_case(&a.video.title, &b.video.title))
}
