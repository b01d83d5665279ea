use chrono::Utc;
use serde::Serialize;

use crate::game::ledger::RewardLedger;
use crate::store::operations::content::BattleContext;
use crate::store::operations::heroes::Hero;
use crate::store::operations::progress::QuestProgress;

/// Monster health is tracked as a percentage on the hero's QuestProgress
/// record (`score`). 100 means defeated and is terminal.
const MONSTER_HP_PERCENT: u32 = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReport {
    pub correct: bool,
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub monster_defeated: bool,
    pub xp_earned: u32,
    pub gold_earned: u32,
    pub levels_gained: u32,
    pub hero_hp: u32,
    pub monster_hp_percent: u32,
}

/// Business-rule soft-fails are ordinary variants here, never errors: the
/// caller renders them with a message instead of special-casing exceptions.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BattleOutcome {
    #[serde(rename_all = "camelCase")]
    CannotAfford { entry_cost: u32, gold: u32 },
    AlreadyDefeated,
    HeroExhausted,
    Answered(AnswerReport),
}

/// The resolution of one submitted answer: the outcome to report, plus the
/// progress row to persist (None when nothing was mutated).
#[derive(Debug)]
pub struct BattleResolution {
    pub outcome: BattleOutcome,
    pub progress: Option<QuestProgress>,
}

pub struct BattleEngine {
    ledger: RewardLedger,
}

impl BattleEngine {
    pub fn new(ledger: RewardLedger) -> Self {
        Self { ledger }
    }

    /// Resolve one quiz answer against the monster guarding the quest.
    ///
    /// The entry cost is charged exactly once, at the transition that creates
    /// the progress record; if the hero cannot afford it, nothing is mutated
    /// and no record is created, so a later retry re-checks affordability.
    /// A defeated monster is terminal: further answers deal no damage and
    /// pay nothing. A hero at zero HP cannot fight at all.
    pub fn resolve_answer(
        &self,
        hero: &mut Hero,
        existing: Option<QuestProgress>,
        ctx: &BattleContext,
        answer: &str,
    ) -> BattleResolution {
        if hero.hp_current == 0 {
            return BattleResolution {
                outcome: BattleOutcome::HeroExhausted,
                progress: None,
            };
        }

        if let Some(progress) = &existing {
            if progress.is_completed {
                return BattleResolution {
                    outcome: BattleOutcome::AlreadyDefeated,
                    progress: None,
                };
            }
        }

        let mut progress = match existing {
            Some(progress) => progress,
            None => {
                if !self.ledger.spend_gold(hero, ctx.monster.entry_cost) {
                    return BattleResolution {
                        outcome: BattleOutcome::CannotAfford {
                            entry_cost: ctx.monster.entry_cost,
                            gold: hero.gold,
                        },
                        progress: None,
                    };
                }
                QuestProgress::fresh(&hero.id, &ctx.quest.id)
            }
        };

        progress.attempts += 1;
        let correct = answer == ctx.question.correct_answer;

        let report = if correct {
            let damage = self.ledger.game().damage_per_hit;
            progress.score = (progress.score + damage).min(MONSTER_HP_PERCENT);

            let defeated = progress.score >= MONSTER_HP_PERCENT;
            let (xp_earned, gold_earned, levels_gained) = if defeated {
                progress.is_completed = true;
                progress.completed_at = Some(Utc::now());
                let award = self.ledger.award_xp(hero, ctx.quest.xp_reward);
                self.ledger.award_gold(hero, ctx.monster.pass_reward);
                (ctx.quest.xp_reward, ctx.monster.pass_reward, award.levels_gained)
            } else {
                (0, 0, 0)
            };

            AnswerReport {
                correct: true,
                damage_dealt: damage,
                damage_taken: 0,
                monster_defeated: defeated,
                xp_earned,
                gold_earned,
                levels_gained,
                hero_hp: hero.hp_current,
                monster_hp_percent: MONSTER_HP_PERCENT - progress.score,
            }
        } else {
            let hero_hp = self.ledger.deal_damage(hero, ctx.monster.fail_penalty);
            AnswerReport {
                correct: false,
                damage_dealt: 0,
                damage_taken: ctx.monster.fail_penalty,
                monster_defeated: false,
                xp_earned: 0,
                gold_earned: 0,
                levels_gained: 0,
                hero_hp,
                monster_hp_percent: MONSTER_HP_PERCENT - progress.score,
            }
        };

        BattleResolution {
            outcome: BattleOutcome::Answered(report),
            progress: Some(progress),
        }
    }
}
