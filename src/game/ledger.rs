use crate::config::GameConfig;
use crate::store::operations::heroes::Hero;

/// Pure stat arithmetic on a hero. No I/O here; callers persist the hero
/// once per logical event after all ledger calls have been applied.
#[derive(Debug, Clone)]
pub struct RewardLedger {
    game: GameConfig,
}

/// What one `award_xp` call did to the hero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
    pub xp_awarded: u32,
    pub levels_gained: u32,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

impl RewardLedger {
    pub fn new(game: GameConfig) -> Self {
        Self { game }
    }

    pub fn game(&self) -> &GameConfig {
        &self.game
    }

    /// Add XP and carry any overflow into levels. Stored XP stays strictly
    /// below the threshold; each level-up recomputes max HP from the level
    /// and restores the hero to full health.
    pub fn award_xp(&self, hero: &mut Hero, amount: u32) -> XpAward {
        // A zero threshold would spin forever; treat it as 1.
        let threshold = self.game.xp_threshold.max(1);

        hero.current_xp += amount;
        let mut levels_gained = 0;
        while hero.current_xp >= threshold {
            hero.current_xp -= threshold;
            hero.level += 1;
            levels_gained += 1;
        }

        if levels_gained > 0 {
            hero.hp_max = self.game.base_hp + (hero.level - 1) * self.game.hp_per_level;
            hero.hp_current = hero.hp_max;
        }

        XpAward {
            xp_awarded: amount,
            levels_gained,
        }
    }

    pub fn award_gold(&self, hero: &mut Hero, amount: u32) -> u32 {
        hero.gold += amount;
        hero.gold
    }

    /// Deduct gold if the hero can afford it. Returns false and leaves the
    /// hero untouched otherwise.
    pub fn spend_gold(&self, hero: &mut Hero, amount: u32) -> bool {
        if hero.gold < amount {
            return false;
        }
        hero.gold -= amount;
        true
    }

    /// Floor at zero; the ledger never kills a hero, callers decide what an
    /// empty health pool means.
    pub fn deal_damage(&self, hero: &mut Hero, amount: u32) -> u32 {
        hero.hp_current = hero.hp_current.saturating_sub(amount);
        hero.hp_current
    }

    pub fn heal_hero(&self, hero: &mut Hero, amount: u32) -> u32 {
        hero.hp_current = (hero.hp_current + amount).min(hero.hp_max);
        hero.hp_current
    }
}
