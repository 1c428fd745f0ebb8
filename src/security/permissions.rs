//! Permission resolution.
//!
//! Modules only declare the permissions they need; the check itself lives
//! here and nowhere else.

use crate::db::{UserInfo, UserLookup};
use crate::intent::Intent;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Granted to everyone.
pub const UNIVERSAL_PERMISSION: &str = "user";

/// Implied by the `is_admin` flag.
pub const ADMIN_PERMISSION: &str = "admin";

/// Who sent an intent, resolved once per dispatch.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    /// The bot's own nick.
    pub is_self: bool,
    pub user: Option<UserInfo>,
}

impl Caller {
    pub fn is_owner(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_owner)
    }
}

/// Decides whether a caller may run a module.
pub struct PermissionGate {
    bot_nick: Arc<RwLock<String>>,
    owner_command: String,
    users: Arc<dyn UserLookup>,
}

impl PermissionGate {
    pub fn new(
        bot_nick: Arc<RwLock<String>>,
        owner_command: impl Into<String>,
        users: Arc<dyn UserLookup>,
    ) -> Self {
        Self {
            bot_nick,
            owner_command: owner_command.into(),
            users,
        }
    }

    pub fn owner_command(&self) -> &str {
        &self.owner_command
    }

    /// Look the sender up by hostmask, falling back to the nick as a
    /// registered username. The fallback only matches when the stored
    /// `user@host` equals the sender's. Lookup failures resolve to an
    /// unknown caller.
    pub async fn resolve(&self, intent: &Intent) -> Caller {
        let is_self = intent.nick.eq_ignore_ascii_case(&self.bot_nick.read());

        let user = match self.users.get_user_by_hostmask(&intent.hostmask).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => match self.users.get_user_by_username(&intent.nick).await {
                Ok(Some(user)) if same_user_host(user.hostmask.as_deref(), &intent.hostmask) => {
                    Some(user)
                }
                Ok(Some(_)) => {
                    debug!(
                        nick = %intent.nick,
                        hostmask = %intent.hostmask,
                        "username matches but user@host does not"
                    );
                    None
                }
                Ok(None) => None,
                Err(e) => {
                    warn!(nick = %intent.nick, error = %e, "user lookup by username failed");
                    None
                }
            },
            Err(e) => {
                warn!(hostmask = %intent.hostmask, error = %e, "user lookup by hostmask failed");
                None
            }
        };

        Caller { is_self, user }
    }

    /// Whether `caller` may run something requiring `required` for `intent`.
    pub fn permits(&self, caller: &Caller, intent: &Intent, required: &[String]) -> bool {
        if caller.is_self {
            return true;
        }
        if intent.command_name() == Some(self.owner_command.as_str()) {
            return true;
        }
        if caller.is_owner() {
            return true;
        }
        if required.iter().any(|p| p == UNIVERSAL_PERMISSION) {
            return true;
        }

        let Some(user) = caller.user.as_ref() else {
            return false;
        };
        let channel_perms = if intent.is_private {
            None
        } else {
            user.permissions.for_channel(&intent.channel)
        };

        required.iter().any(|p| {
            (user.is_admin && p == ADMIN_PERMISSION)
                || user.permissions.global.contains(p)
                || channel_perms.is_some_and(|perms| perms.contains(p))
        })
    }
}

/// The `user@host` part of a `nick!user@host` mask.
fn user_host(mask: &str) -> Option<&str> {
    mask.split_once('!')
        .map(|(_, rest)| rest)
        .filter(|rest| rest.contains('@'))
}

fn same_user_host(stored: Option<&str>, sender: &str) -> bool {
    match (stored.and_then(user_host), user_host(sender)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbError, Permissions};
    use crate::intent::IntentKind;
    use async_trait::async_trait;
    use std::collections::BTreeSet;

    struct FixedUsers(Vec<UserInfo>);

    #[async_trait]
    impl UserLookup for FixedUsers {
        async fn get_user_by_hostmask(&self, hostmask: &str) -> Result<Option<UserInfo>, DbError> {
            Ok(self
                .0
                .iter()
                .find(|u| u.hostmask.as_deref() == Some(hostmask))
                .cloned())
        }

        async fn get_user_by_username(&self, username: &str) -> Result<Option<UserInfo>, DbError> {
            Ok(self.0.iter().find(|u| u.username == username).cloned())
        }
    }

    fn user(name: &str, hostmask: Option<&str>) -> UserInfo {
        UserInfo {
            id: 1,
            username: name.to_string(),
            hostmask: hostmask.map(String::from),
            is_owner: false,
            is_admin: false,
            permissions: Permissions::default(),
        }
    }

    fn gate(users: Vec<UserInfo>) -> PermissionGate {
        PermissionGate::new(
            Arc::new(RwLock::new("slircbot".to_string())),
            "owner",
            Arc::new(FixedUsers(users)),
        )
    }

    fn command(nick: &str, name: &str, channel: &str) -> Intent {
        Intent {
            kind: IntentKind::Command {
                name: name.to_string(),
                args: String::new(),
            },
            raw_text: format!("!{name}"),
            channel: channel.to_string(),
            nick: nick.to_string(),
            hostmask: format!("{nick}!{nick}@example.net"),
            is_private: !channel.starts_with('#'),
        }
    }

    fn perms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_user_permission_admits_unknown_identity() {
        let gate = gate(vec![]);
        let intent = command("stranger", "karma", "#test");
        let caller = gate.resolve(&intent).await;
        assert!(caller.user.is_none());
        assert!(gate.permits(&caller, &intent, &perms(&["user"])));
        assert!(!gate.permits(&caller, &intent, &perms(&["admin"])));
    }

    #[tokio::test]
    async fn test_owner_claim_is_always_admitted() {
        let gate = gate(vec![]);
        let intent = command("stranger", "owner", "#test");
        let caller = gate.resolve(&intent).await;
        assert!(gate.permits(&caller, &intent, &perms(&["nobody-has-this"])));
    }

    #[tokio::test]
    async fn test_self_passes() {
        let gate = gate(vec![]);
        let intent = command("SlircBot", "forget", "#test");
        let caller = gate.resolve(&intent).await;
        assert!(gate.permits(&caller, &intent, &perms(&["admin"])));
    }

    #[tokio::test]
    async fn test_owner_found_by_username_fallback() {
        let mut owner = user("alice", Some("ali!alice@example.net"));
        owner.is_owner = true;
        let gate = gate(vec![owner]);

        let intent = command("alice", "forget", "#test");
        let caller = gate.resolve(&intent).await;
        assert!(caller.is_owner());
        assert!(gate.permits(&caller, &intent, &perms(&["admin"])));
    }

    #[tokio::test]
    async fn test_username_fallback_requires_matching_user_host() {
        let mut owner = user("alice", Some("alice!alice@example.net"));
        owner.is_owner = true;
        let nameless = user("bob", None);
        let gate = gate(vec![owner, nameless]);

        let mut intent = command("alice", "forget", "#test");
        intent.hostmask = "alice!evil@attacker.example".to_string();
        let caller = gate.resolve(&intent).await;
        assert!(caller.user.is_none());
        assert!(!gate.permits(&caller, &intent, &perms(&["admin"])));

        let intent = command("bob", "forget", "#test");
        assert!(gate.resolve(&intent).await.user.is_none());
    }

    #[test]
    fn user_host_comparison() {
        assert!(same_user_host(Some("a!u@H.example"), "b!u@h.example"));
        assert!(!same_user_host(Some("a!u@h.example"), "a!x@h.example"));
        assert!(!same_user_host(None, "a!u@h"));
        assert!(!same_user_host(Some("a!u@h"), "a"));
    }

    #[tokio::test]
    async fn test_global_channel_and_admin_grants() {
        let mut bob = user("bob", Some("bob!bob@example.net"));
        bob.permissions.global = BTreeSet::from(["factoids".to_string()]);
        bob.permissions
            .channels
            .insert("#ops".to_string(), BTreeSet::from(["kick".to_string()]));
        let mut carol = user("carol", Some("carol!carol@example.net"));
        carol.is_admin = true;
        let gate = gate(vec![bob, carol]);

        let in_test = command("bob", "x", "#test");
        let caller = gate.resolve(&in_test).await;
        assert!(gate.permits(&caller, &in_test, &perms(&["kick", "factoids"])));
        assert!(!gate.permits(&caller, &in_test, &perms(&["kick"])));

        let in_ops = command("bob", "x", "#OPS");
        assert!(gate.permits(&caller, &in_ops, &perms(&["kick"])));

        let query = command("bob", "x", "bob");
        assert!(!gate.permits(&caller, &query, &perms(&["kick"])));

        let admin = command("carol", "x", "#test");
        let caller = gate.resolve(&admin).await;
        assert!(gate.permits(&caller, &admin, &perms(&["admin"])));
        assert!(!gate.permits(&caller, &admin, &perms(&["kick"])));
    }
}
