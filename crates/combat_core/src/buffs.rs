//! Timed stat modifiers layered on top of an agent's base stats.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Additive deltas applied to [`AgentStats`](crate::agent::AgentStats).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatModifiers {
    pub armor: f32,
    pub attack_damage: f32,
    pub health_regen: f32,
    pub move_speed: f32,
}

impl StatModifiers {
    fn accumulate(&mut self, other: &Self) {
        self.armor += other.armor;
        self.attack_damage += other.attack_damage;
        self.health_regen += other.health_regen;
        self.move_speed += other.move_speed;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    pub name: String,
    #[serde(default)]
    pub modifiers: StatModifiers,
    /// `None` keeps the buff until the agent is removed.
    #[serde(default)]
    pub duration_secs: Option<f32>,
}

impl Buff {
    pub fn new(name: impl Into<String>, modifiers: StatModifiers) -> Self {
        Self {
            name: name.into(),
            modifiers,
            duration_secs: None,
        }
    }

    pub fn lasting(mut self, secs: f32) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

#[derive(Clone, Debug)]
struct ActiveBuff {
    buff: Buff,
    expires_at: Option<Duration>,
}

#[derive(Clone, Debug, Default)]
pub struct ActiveBuffs {
    entries: Vec<ActiveBuff>,
}

impl ActiveBuffs {
    /// Adds `buff`, or refreshes the existing buff with the same name.
    pub fn apply(&mut self, buff: Buff, now: Duration) {
        let expires_at = buff
            .duration_secs
            .map(|secs| now + Duration::try_from_secs_f32(secs).unwrap_or_default());
        if let Some(existing) = self.entries.iter_mut().find(|e| e.buff.name == buff.name) {
            existing.buff = buff;
            existing.expires_at = expires_at;
        } else {
            self.entries.push(ActiveBuff { buff, expires_at });
        }
    }

    /// Drops every buff whose duration has run out and returns their names.
    pub fn expire(&mut self, now: Duration) -> Vec<String> {
        let mut expired = Vec::new();
        self.entries.retain(|entry| match entry.expires_at {
            Some(at) if at <= now => {
                expired.push(entry.buff.name.clone());
                false
            }
            _ => true,
        });
        expired
    }

    pub fn total(&self) -> StatModifiers {
        let mut total = StatModifiers::default();
        for entry in &self.entries {
            total.accumulate(&entry.buff.modifiers);
        }
        total
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.buff.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
