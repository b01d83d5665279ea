use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// The hero record: account identity plus the RPG stat block mutated by the
/// progression core. `current_xp` is always the overflow remainder below the
/// leveling threshold and `hp_current` never exceeds `hp_max`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub level: u32,
    pub current_xp: u32,
    pub hp_current: u32,
    pub hp_max: u32,
    pub gold: u32,
    pub avatar_class: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hero {
    /// Fresh level-1 hero with full HP and the configured starting gold.
    pub fn new_registered(
        id: String,
        email: String,
        username: String,
        password_hash: String,
        avatar_class: String,
        game: &GameConfig,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            username,
            password_hash,
            level: 1,
            current_xp: 0,
            hp_current: game.base_hp,
            hp_max: game.base_hp,
            gold: game.starting_gold,
            avatar_class,
            title: "Newcomer".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Store {
    pub fn create_hero(&self, hero: &Hero) -> Result<(), StoreError> {
        let email_key = keys::hero_email_index_key(&hero.email);

        // Atomic compare-and-swap on the email index so two concurrent
        // registrations with the same email cannot both pass an existence check.
        let cas_result = self
            .heroes
            .compare_and_swap(
                email_key.as_bytes(),
                None::<&[u8]>,
                Some(hero.id.as_bytes().to_vec()),
            )
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "hero_email".to_string(),
                key: hero.email.clone(),
            });
        }

        let hero_key = keys::hero_key(&hero.id);
        let hero_bytes = Self::serialize(hero)?;
        if let Err(e) = self.heroes.insert(hero_key.as_bytes(), hero_bytes) {
            let _ = self.heroes.remove(email_key.as_bytes());
            return Err(StoreError::Sled(e));
        }

        Ok(())
    }

    pub fn get_hero_by_id(&self, hero_id: &str) -> Result<Option<Hero>, StoreError> {
        let key = keys::hero_key(hero_id);
        match self.heroes.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_hero_by_email(&self, email: &str) -> Result<Option<Hero>, StoreError> {
        let index_key = keys::hero_email_index_key(email);
        let Some(hero_id_raw) = self.heroes.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        let hero_id = match String::from_utf8(hero_id_raw.to_vec()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid UTF-8 in hero email index");
                return Ok(None);
            }
        };
        self.get_hero_by_id(&hero_id)
    }

    /// Persist the current state of an existing hero. The progression façade
    /// calls this once per event, after all ledger mutations are applied.
    pub fn save_hero(&self, hero: &Hero) -> Result<(), StoreError> {
        if self
            .heroes
            .get(keys::hero_key(&hero.id).as_bytes())?
            .is_none()
        {
            return Err(StoreError::NotFound {
                entity: "hero".to_string(),
                key: hero.id.clone(),
            });
        }

        let mut updated = hero.clone();
        updated.updated_at = Utc::now();
        let bytes = Self::serialize(&updated)?;
        self.heroes
            .insert(keys::hero_key(&hero.id).as_bytes(), bytes)?;
        Ok(())
    }
}
