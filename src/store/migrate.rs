use once_cell::sync::Lazy;

use crate::store::operations::achievements::{Achievement, AchievementKind};
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_seed_achievements", m002_seed_achievements),
    ]
}

/// Built-in quest-type achievement ladder. Additional achievements can be
/// inserted by content tooling; these ids stay reserved.
static SEED_ACHIEVEMENTS: Lazy<Vec<Achievement>> = Lazy::new(|| {
    vec![
        Achievement {
            id: 1,
            name: "First Steps".to_string(),
            description: "Complete your first quest".to_string(),
            kind: AchievementKind::Quest,
            requirement_value: 1,
            xp_reward: 25,
            gold_reward: 10,
            title_reward: None,
        },
        Achievement {
            id: 2,
            name: "Adventurer".to_string(),
            description: "Complete 10 quests".to_string(),
            kind: AchievementKind::Quest,
            requirement_value: 10,
            xp_reward: 100,
            gold_reward: 50,
            title_reward: Some("Adventurer".to_string()),
        },
        Achievement {
            id: 3,
            name: "Quest Veteran".to_string(),
            description: "Complete 50 quests".to_string(),
            kind: AchievementKind::Quest,
            requirement_value: 50,
            xp_reward: 500,
            gold_reward: 250,
            title_reward: Some("Veteran of the Academy".to_string()),
        },
    ]
});

/// Run all unapplied migrations.
///
/// Each migration must be idempotent: a crash between a migration body and
/// its version checkpoint means the body runs again on the next start.
/// Version numbers only move forward; downgrades are rejected.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().unwrap_or([0; 4]);
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

fn m002_seed_achievements(store: &Store) -> Result<(), StoreError> {
    for achievement in SEED_ACHIEVEMENTS.iter() {
        // put is idempotent; re-running after a partial seed is harmless
        store.put_achievement(achievement)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn migration_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        run(&store).unwrap();
        let first = get_current_version(&store).unwrap();
        run(&store).unwrap();
        let second = get_current_version(&store).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn seed_achievements_installed_once() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db2").to_str().unwrap()).unwrap();

        run(&store).unwrap();
        run(&store).unwrap();
        let achievements = store.list_achievements().unwrap();
        assert_eq!(achievements.len(), 3);
        assert_eq!(achievements[0].requirement_value, 1);
    }

    #[test]
    fn downgrade_is_rejected() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db3").to_str().unwrap()).unwrap();

        set_version(&store, 3).unwrap();
        let err = set_version(&store, 2).unwrap_err();
        assert!(matches!(err, StoreError::Migration { .. }));
    }
}
