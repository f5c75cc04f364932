//! Admin checks.

use parking_lot::RwLock;

use demibot_core::nick_of;

use crate::config::BotConfig;

/// Decides who may run admin commands (`rehash`).
pub trait Authorizer: Send + Sync {
    /// Returns `true` if `user` (usually a `nick!user@host` mask) is an admin.
    fn is_admin(&self, user: &str) -> bool;

    /// Picks up a new configuration. Called during rehash.
    fn refresh(&self, _config: &BotConfig) {}
}

/// Admin list from the `admins` config key.
///
/// An entry containing `!` must match the full mask; any other entry matches
/// the nickname. Both compare case-insensitively.
#[derive(Debug, Default)]
pub struct AdminList {
    admins: RwLock<Vec<String>>,
}

impl AdminList {
    pub fn new(admins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            admins: RwLock::new(admins.into_iter().map(Into::into).collect()),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(config.admins.iter().cloned())
    }
}

impl Authorizer for AdminList {
    fn is_admin(&self, user: &str) -> bool {
        let nick = nick_of(user);
        self.admins.read().iter().any(|admin| {
            if admin.contains('!') {
                admin.eq_ignore_ascii_case(user)
            } else {
                admin.eq_ignore_ascii_case(nick)
            }
        })
    }

    fn refresh(&self, config: &BotConfig) {
        *self.admins.write() = config.admins.clone();
    }
}
