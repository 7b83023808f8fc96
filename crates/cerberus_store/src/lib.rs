//! Configuration store for the Cerberus guild guard.
//!
//! Holds every record the guard persists: authorization grants, trusted
//! operators, rate thresholds, sanction policies, limited role and mention
//! sets, module switches, guild snapshots, and report-channel routing. The
//! engine treats this purely as get/set/list/delete by composite key; the
//! backing representation is a single JSON document, written through on
//! every mutation when a path is configured.
//!
//! Writes are last-write-wins by design; there is no conflict model.

#![warn(missing_docs)]

mod document;

pub use document::{ReportStream, StoreDocument};

use cerberus_core::{
    ActionKind, AuthorizationGrant, ChannelRef, GrantScope, GuildRef, GuildSnapshot, MentionTarget,
    ModuleSwitch, Principal, RoleRef, SanctionPolicy, ThresholdPolicy,
};
use cerberus_error::{StoreError, StoreErrorKind, StoreResult};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

/// The configuration store.
///
/// In-memory state behind a read-write lock, with optional write-through
/// persistence. Reads are concurrent; mutations serialize on the write lock
/// and persist before returning.
#[derive(Debug)]
pub struct GuardStore {
    state: RwLock<StoreDocument>,
    path: Option<PathBuf>,
}

impl GuardStore {
    /// An in-memory store seeded with the factory defaults.
    pub fn seeded() -> Self {
        Self {
            state: RwLock::new(StoreDocument::seeded()),
            path: None,
        }
    }

    /// An in-memory store with the given initial state.
    pub fn from_document(document: StoreDocument) -> Self {
        Self {
            state: RwLock::new(document),
            path: None,
        }
    }

    /// Open the store at `path`, seeding the factory defaults when the file
    /// does not exist yet.
    #[tracing::instrument(skip(path))]
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            tracing::info!(path = %path.display(), "Seeding new store");
            StoreDocument::seeded()
        };
        let store = Self {
            state: RwLock::new(state),
            path: Some(path),
        };
        store.persist(&store.state.read())?;
        Ok(store)
    }

    fn persist(&self, state: &StoreDocument) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_string_pretty(state)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StoreDocument) -> T) -> StoreResult<T> {
        let mut state = self.state.write();
        let out = f(&mut state);
        self.persist(&state)?;
        Ok(out)
    }

    // --- grants ---

    /// Set a grant, replacing any previous scope for the same
    /// (guild, principal).
    pub fn set_grant(&self, grant: AuthorizationGrant) -> StoreResult<()> {
        self.mutate(|state| {
            state
                .grants
                .retain(|g| !(g.guild == grant.guild && g.principal == grant.principal));
            state.grants.push(grant);
        })
    }

    /// Widen an existing grant by unioning `scope` into it, or create the
    /// grant when none exists.
    pub fn widen_grant(
        &self,
        guild: GuildRef,
        principal: Principal,
        scope: GrantScope,
    ) -> StoreResult<()> {
        self.mutate(|state| {
            match state
                .grants
                .iter_mut()
                .find(|g| g.guild == guild && g.principal == principal)
            {
                Some(existing) => existing.scope = existing.scope.union(&scope),
                None => state.grants.push(AuthorizationGrant {
                    guild,
                    principal,
                    scope,
                }),
            }
        })
    }

    /// Remove a principal's grant within a guild.
    pub fn remove_grant(&self, guild: GuildRef, principal: Principal) -> StoreResult<()> {
        self.mutate(|state| {
            state
                .grants
                .retain(|g| !(g.guild == guild && g.principal == principal));
        })
    }

    /// The grant held by a principal within a guild, if any.
    pub fn grant(&self, guild: GuildRef, principal: Principal) -> Option<AuthorizationGrant> {
        self.state
            .read()
            .grants
            .iter()
            .find(|g| g.guild == guild && g.principal == principal)
            .cloned()
    }

    /// All grants within a guild.
    pub fn grants(&self, guild: GuildRef) -> Vec<AuthorizationGrant> {
        self.state
            .read()
            .grants
            .iter()
            .filter(|g| g.guild == guild)
            .cloned()
            .collect()
    }

    // --- trusted operators ---

    /// Mark a principal as a trusted operator in every guild.
    pub fn add_operator(&self, principal: Principal) -> StoreResult<()> {
        self.mutate(|state| {
            state.trusted_operators.insert(principal);
        })
    }

    /// Remove a principal's global trusted-operator flag.
    pub fn remove_operator(&self, principal: Principal) -> StoreResult<()> {
        self.mutate(|state| {
            state.trusted_operators.remove(&principal);
        })
    }

    /// Whether a principal is a global trusted operator.
    pub fn is_operator(&self, principal: Principal) -> bool {
        self.state.read().trusted_operators.contains(&principal)
    }

    /// All global trusted operators.
    pub fn operators(&self) -> Vec<Principal> {
        self.state.read().trusted_operators.iter().copied().collect()
    }

    /// Mark a principal as a trusted operator within one guild.
    pub fn add_guild_operator(&self, guild: GuildRef, principal: Principal) -> StoreResult<()> {
        self.mutate(|state| {
            state.guild_operators.entry(guild).or_default().insert(principal);
        })
    }

    /// Remove a principal's guild trusted-operator flag.
    pub fn remove_guild_operator(&self, guild: GuildRef, principal: Principal) -> StoreResult<()> {
        self.mutate(|state| {
            if let Some(set) = state.guild_operators.get_mut(&guild) {
                set.remove(&principal);
                if set.is_empty() {
                    state.guild_operators.remove(&guild);
                }
            }
        })
    }

    /// Whether a principal is a trusted operator within the guild.
    pub fn is_guild_operator(&self, guild: GuildRef, principal: Principal) -> bool {
        self.state
            .read()
            .guild_operators
            .get(&guild)
            .is_some_and(|set| set.contains(&principal))
    }

    // --- thresholds ---

    /// Set a threshold policy, process-wide or as a guild override.
    pub fn set_threshold(
        &self,
        guild: Option<GuildRef>,
        kind: ActionKind,
        policy: ThresholdPolicy,
    ) -> StoreResult<()> {
        self.mutate(|state| match guild {
            Some(guild) => {
                state
                    .guild_thresholds
                    .entry(guild)
                    .or_default()
                    .insert(kind, policy);
            }
            None => {
                state.thresholds.insert(kind, policy);
            }
        })
    }

    /// Remove a threshold policy; escalation for the kind is disabled when
    /// neither an override nor a global policy remains.
    pub fn clear_threshold(&self, guild: Option<GuildRef>, kind: ActionKind) -> StoreResult<()> {
        self.mutate(|state| match guild {
            Some(guild) => {
                if let Some(map) = state.guild_thresholds.get_mut(&guild) {
                    map.remove(&kind);
                    if map.is_empty() {
                        state.guild_thresholds.remove(&guild);
                    }
                }
            }
            None => {
                state.thresholds.remove(&kind);
            }
        })
    }

    /// The effective threshold for a guild and kind: the guild override when
    /// present, otherwise the process-wide policy.
    pub fn threshold(&self, guild: GuildRef, kind: ActionKind) -> Option<ThresholdPolicy> {
        let state = self.state.read();
        state
            .guild_thresholds
            .get(&guild)
            .and_then(|map| map.get(&kind))
            .or_else(|| state.thresholds.get(&kind))
            .copied()
    }

    // --- sanctions ---

    /// Set the sanction policy for an action kind.
    pub fn set_sanction(&self, kind: ActionKind, policy: SanctionPolicy) -> StoreResult<()> {
        self.mutate(|state| {
            state.sanctions.insert(kind, policy);
        })
    }

    /// The sanction policy for an action kind, if configured.
    pub fn sanction(&self, kind: ActionKind) -> Option<SanctionPolicy> {
        self.state.read().sanctions.get(&kind).copied()
    }

    // --- limited roles and mentions ---

    /// Add a role to the limited set.
    pub fn add_limited_role(&self, role: RoleRef, name: impl Into<String>) -> StoreResult<()> {
        let name = name.into();
        self.mutate(|state| {
            state.limited_roles.insert(role, name);
        })
    }

    /// Remove a role from the limited set.
    pub fn remove_limited_role(&self, role: RoleRef) -> StoreResult<()> {
        self.mutate(|state| {
            state.limited_roles.remove(&role);
        })
    }

    /// Whether a role is limited.
    pub fn is_limited_role(&self, role: RoleRef) -> bool {
        self.state.read().limited_roles.contains_key(&role)
    }

    /// The limited roles with their display names.
    pub fn limited_roles(&self) -> Vec<(RoleRef, String)> {
        self.state
            .read()
            .limited_roles
            .iter()
            .map(|(role, name)| (*role, name.clone()))
            .collect()
    }

    /// Add a mention target to the limited set.
    pub fn add_limited_mention(&self, target: MentionTarget) -> StoreResult<()> {
        self.mutate(|state| {
            state.limited_mentions.insert(target);
        })
    }

    /// Remove a mention target from the limited set.
    pub fn remove_limited_mention(&self, target: MentionTarget) -> StoreResult<()> {
        self.mutate(|state| {
            state.limited_mentions.remove(&target);
        })
    }

    /// Whether a mention target is limited.
    pub fn is_limited_mention(&self, target: MentionTarget) -> bool {
        self.state.read().limited_mentions.contains(&target)
    }

    /// The limited mention targets.
    pub fn limited_mentions(&self) -> Vec<MentionTarget> {
        self.state.read().limited_mentions.iter().copied().collect()
    }

    // --- module switches ---

    /// Arm an enforcement module.
    pub fn enable_module(&self, kind: ActionKind) -> StoreResult<()> {
        self.mutate(|state| {
            state.modules.entry(kind).or_default().enable();
        })
    }

    /// Request a transient disable of a module at `now`.
    pub fn disable_module(&self, kind: ActionKind, now: DateTime<Utc>) -> StoreResult<()> {
        self.mutate(|state| {
            state.modules.entry(kind).or_default().disable(now);
        })
    }

    /// Whether the module enforces at `now`, under the given grace period.
    pub fn module_active(&self, kind: ActionKind, grace: Duration, now: DateTime<Utc>) -> bool {
        self.state
            .read()
            .modules
            .get(&kind)
            .copied()
            .unwrap_or_default()
            .is_active(grace, now)
    }

    /// The raw switch state for a module.
    pub fn module(&self, kind: ActionKind) -> ModuleSwitch {
        self.state.read().modules.get(&kind).copied().unwrap_or_default()
    }

    // --- snapshots ---

    /// The current snapshot for a guild, if one has been captured.
    pub fn snapshot(&self, guild: GuildRef) -> Option<GuildSnapshot> {
        self.state.read().snapshots.get(&guild).cloned()
    }

    /// Store a snapshot, overwriting any previous one for the guild.
    pub fn capture(&self, snapshot: GuildSnapshot) -> StoreResult<()> {
        self.mutate(|state| {
            state.snapshots.insert(*snapshot.guild(), snapshot);
        })
    }

    // --- report channels ---

    /// Route a report stream for a guild to a channel.
    pub fn set_report_channel(
        &self,
        guild: GuildRef,
        stream: ReportStream,
        channel: ChannelRef,
    ) -> StoreResult<()> {
        self.mutate(|state| {
            state
                .report_channels
                .entry(guild)
                .or_default()
                .insert(stream, channel);
        })
    }

    /// Remove a guild's routing for a report stream.
    pub fn clear_report_channel(&self, guild: GuildRef, stream: ReportStream) -> StoreResult<()> {
        self.mutate(|state| {
            if let Some(map) = state.report_channels.get_mut(&guild) {
                map.remove(&stream);
                if map.is_empty() {
                    state.report_channels.remove(&guild);
                }
            }
        })
    }

    /// The channel routed for a guild's report stream, if any.
    pub fn report_channel(&self, guild: GuildRef, stream: ReportStream) -> Option<ChannelRef> {
        self.state
            .read()
            .report_channels
            .get(&guild)
            .and_then(|map| map.get(&stream))
            .copied()
    }

    // --- export / import ---

    /// A copy of the complete configuration state.
    pub fn export(&self) -> StoreDocument {
        self.state.read().clone()
    }

    /// Replace the complete configuration state with `document`.
    ///
    /// The swap happens under one write lock; readers see either the old
    /// state or the new, never a mixture. Nothing is replaced if the
    /// document fails to persist.
    #[tracing::instrument(skip(self, document))]
    pub fn import(&self, document: StoreDocument) -> StoreResult<()> {
        let mut state = self.state.write();
        self.persist(&document).map_err(|e| {
            StoreError::new(StoreErrorKind::ImportRejected(e.to_string()))
        })?;
        *state = document;
        tracing::info!("Store state replaced from import");
        Ok(())
    }
}
