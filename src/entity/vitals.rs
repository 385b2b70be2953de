//! Regenerating resource pools (hp, mp, cp)

use serde::{Deserialize, Serialize};

/// Current, maximum and per-tick regeneration of each pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub cur_hp: f64,
    pub max_hp: f64,
    pub hp_regen: f64,
    pub cur_mp: f64,
    pub max_mp: f64,
    pub mp_regen: f64,
    pub cur_cp: f64,
    pub max_cp: f64,
    pub cp_regen: f64,
}

impl Default for Vitals {
    fn default() -> Self {
        Self::full(100.0, 50.0, 0.0)
    }
}

impl Vitals {
    /// Full pools with a regeneration rate of 1% of max per tick
    pub fn full(max_hp: f64, max_mp: f64, max_cp: f64) -> Self {
        Self {
            cur_hp: max_hp,
            max_hp,
            hp_regen: max_hp * 0.01,
            cur_mp: max_mp,
            max_mp,
            mp_regen: max_mp * 0.01,
            cur_cp: max_cp,
            max_cp,
            cp_regen: max_cp * 0.01,
        }
    }

    /// Apply one regeneration tick, clamped to max
    pub fn regenerate(&mut self) {
        self.cur_hp = (self.cur_hp + self.hp_regen).min(self.max_hp);
        self.cur_mp = (self.cur_mp + self.mp_regen).min(self.max_mp);
        self.cur_cp = (self.cur_cp + self.cp_regen).min(self.max_cp);
    }

    /// Remove hp, returns true when the pool is emptied
    pub fn reduce_hp(&mut self, amount: f64) -> bool {
        self.cur_hp = (self.cur_hp - amount).max(0.0);
        self.cur_hp <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.cur_hp >= self.max_hp && self.cur_mp >= self.max_mp && self.cur_cp >= self.max_cp
    }

    /// Whole-number values as shown to clients
    pub fn displayed(&self) -> (u32, u32, u32) {
        (
            self.cur_hp.floor() as u32,
            self.cur_mp.floor() as u32,
            self.cur_cp.floor() as u32,
        )
    }
}
