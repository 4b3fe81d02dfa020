use crate::catalog::GameVariant;
use crate::models::{DashboardStats, GameResult, LeaderboardEntry, WeeklyPoint};
use crate::session::{SessionSnapshot, SessionStatus};
use crate::variant::VariantKind;

const BAR_WIDTH: usize = 20;

pub fn action_prompt(kind: VariantKind) -> &'static str {
    match kind {
        VariantKind::SquatTap => "TAP FOR SQUAT",
        VariantKind::JumpCounter => "TAP FOR JUMP",
        VariantKind::PlankTimer => "HOLD PLANK",
        VariantKind::BurpeeChallenge => "TAP FOR BURPEE",
    }
}

/// `m:ss`
pub fn format_timer(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// `first_workout` -> `FIRST WORKOUT`
pub fn badge_label(badge_id: &str) -> String {
    badge_id.replace('_', " ").to_uppercase()
}

pub fn progress_bar(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        (fraction * 100.0).floor() as u32
    )
}

pub fn render_catalog_entry(variant: &GameVariant) -> String {
    let unit = match variant.kind {
        VariantKind::PlankTimer => "s hold",
        _ => " reps",
    };
    format!(
        "{:<18} {:<22} target {}{unit} within {}  {}",
        variant.kind.as_str(),
        variant.name,
        variant.target_score,
        format_timer(u64::from(variant.time_limit)),
        variant.description
    )
}

pub fn render_status(snapshot: &SessionSnapshot) -> String {
    let state = match snapshot.status {
        SessionStatus::Active => "",
        SessionStatus::Completed => "  done",
    };
    format!(
        "{} {}  score {}  ~{} pts  ~{} kcal  {}{state}",
        format_timer(snapshot.elapsed_seconds),
        progress_bar(snapshot.progress),
        snapshot.score,
        snapshot.metrics.points,
        snapshot.metrics.calories,
        action_prompt(snapshot.kind),
    )
}

pub fn render_result(result: &GameResult) -> String {
    let mut lines = vec![
        format!("Points earned:   {}", result.points_earned),
        format!("Calories burned: {}", result.calories_burned.floor() as i64),
    ];
    if let Some(best) = result.best_score {
        let marker = if result.is_personal_best == Some(true) {
            "  (personal best!)"
        } else {
            ""
        };
        lines.push(format!("Best score:      {best}{marker}"));
    }
    if let Some(streak) = result.current_streak {
        lines.push(format!("Streak:          {streak} day(s)"));
    }
    if !result.new_badges.is_empty() {
        let plural = if result.new_badges.len() > 1 { "s" } else { "" };
        lines.push(format!("New badge{plural} earned!"));
        lines.extend(result.new_badges.iter().map(|b| format!("  * {}", badge_label(b))));
    }
    lines.extend(
        result
            .new_achievements
            .iter()
            .map(|a| format!("  * achievement unlocked: {}", a.name)),
    );
    lines.join("\n")
}

pub fn render_leaderboard(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "No scores yet.".to_string();
    }
    entries
        .iter()
        .enumerate()
        .map(|(rank, entry)| {
            format!(
                "{:>2}. {:<16} best {:>4}  played {:>3}  avg {:.1}",
                rank + 1,
                entry.username,
                entry.best_score,
                entry.games_played,
                entry.average_score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_stats(stats: &DashboardStats) -> String {
    format!(
        "points {}  workouts {}  calories {}  active {} min  badges {}",
        stats.points,
        stats.workouts_completed,
        stats.calories_burned.floor() as i64,
        stats.time_active.floor() as i64,
        stats.badges
    )
}

pub fn render_week(points: &[WeeklyPoint]) -> String {
    points
        .iter()
        .map(|p| {
            format!(
                "{:<10} {:>5} kcal  {:>2} workouts  {:>4} min",
                p.day,
                p.calories.floor() as i64,
                p.workouts,
                p.time_active.floor() as i64
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
