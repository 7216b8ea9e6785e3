const MILESTONE_LEVELS: [i32; 4] = [1, 3, 7, 12];
const CADENCE_START: i32 = 19;
const CADENCE: i32 = 7;

/// Whether reaching `level` earns a badge: the milestones 1, 3, 7 and 12,
/// then every seventh level counted from 12 (19, 26, 33, ...).
pub fn should_award_badge(level: i32) -> bool {
    if MILESTONE_LEVELS.contains(&level) {
        return true;
    }
    level >= CADENCE_START && (level - 12) % CADENCE == 0
}
