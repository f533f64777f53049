//! Achievement badges.

use varun_server_models::Badge;

/// Liters a user must save to earn "Water Warrior".
pub const WATER_WARRIOR_LITERS: f64 = 1000.0;

/// Streak length that earns "Week Streak".
pub const WEEK_STREAK_DAYS: u32 = 7;

/// Leaderboard positions that earn "Community Hero".
pub const COMMUNITY_HERO_RANK: u32 = 10;

/// What the badge calculation needs to know about a user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Cumulative harvested water, liters.
    pub liters_saved: f64,
    /// Consecutive active days.
    pub streak_days: u32,
    /// Whether the user is in the leaderboard's top
    /// [`COMMUNITY_HERO_RANK`].
    pub top_ranked: bool,
}

fn badge(id: &str, name: &str, description: &str, icon: &str, color: &str, earned: bool) -> Badge {
    Badge {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        earned,
        earned_date: None,
    }
}

/// The full badge list with `earned` set for `progress`.
#[must_use]
pub fn badges(progress: Progress) -> Vec<Badge> {
    vec![
        badge(
            "water_warrior",
            "Water Warrior",
            "Saved over 1000 liters",
            "water",
            "#2196F3",
            progress.liters_saved >= WATER_WARRIOR_LITERS,
        ),
        badge(
            "first_drop",
            "First Drop",
            "Completed first assessment",
            "water-check",
            "#4CAF50",
            true,
        ),
        badge(
            "week_streak",
            "Week Streak",
            "7 days active streak",
            "fire",
            "#FF9800",
            progress.streak_days >= WEEK_STREAK_DAYS,
        ),
        badge(
            "community_hero",
            "Community Hero",
            "Top 10 in leaderboard",
            "account-group",
            "#9C27B0",
            progress.top_ranked,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earned(progress: Progress) -> Vec<String> {
        badges(progress)
            .into_iter()
            .filter(|b| b.earned)
            .map(|b| b.id)
            .collect()
    }

    #[test]
    fn newcomer_has_first_drop_only() {
        let progress = Progress {
            liters_saved: 0.0,
            streak_days: 0,
            top_ranked: false,
        };
        assert_eq!(badges(progress).len(), 4);
        assert_eq!(earned(progress), vec!["first_drop"]);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let progress = Progress {
            liters_saved: 1000.0,
            streak_days: 7,
            top_ranked: true,
        };
        assert_eq!(
            earned(progress),
            vec!["water_warrior", "first_drop", "week_streak", "community_hero"]
        );

        let progress = Progress {
            liters_saved: 999.9,
            streak_days: 6,
            top_ranked: false,
        };
        assert_eq!(earned(progress), vec!["first_drop"]);
    }
}
