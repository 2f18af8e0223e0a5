//! Per-tenant message store cache with double-checked provisioning.
//!
//! Two copy-on-write lookup maps (tenant -> store, database -> store) sit
//! behind `ArcSwap`, so the hot path is a single lock-free snapshot load.
//! A single `parking_lot::Mutex` serializes the decide-construct-publish
//! step; it is never held across an `.await`, so configuration and schema
//! migration of one database never block resolution of another.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use postbox_core::{
    AutoCreate, DatabaseCardinality, DatabaseHandle, DatabaseId, DatabaseSource, MessageStore,
    TenantId,
};
use tracing::{debug, info, info_span, warn, Instrument};

use super::config::{ProvisioningFailurePolicy, TenantStoreConfig};
use super::configuration::{ConfigurationRegistry, StoreConfiguration};
use super::error::TenancyError;
use super::slot::{Readiness, StoreSlot};
use crate::runtime::MessagingRuntime;
use crate::storage::{MessageStoreFactory, SchemaMigrator, StoreInitializer, StoreTemplate};

type SlotMap<K> = HashMap<K, Arc<StoreSlot>>;

/// Outcome of the critical section.
enum Claim {
    /// Another caller already published a store.
    Existing(Arc<StoreSlot>),
    /// This caller built and published the store and must finish provisioning.
    Built(Arc<StoreSlot>),
}

/// Settles a slot left in `Provisioning` when its builder is cancelled or
/// panics, so waiters on the same database are released.
struct ProvisioningGuard<'a> {
    cache: &'a TenantStoreCache,
    slot: &'a Arc<StoreSlot>,
}

impl Drop for ProvisioningGuard<'_> {
    fn drop(&mut self) {
        if self.slot.readiness() == Readiness::Provisioning {
            self.cache.settle_failed(self.slot, "provisioning did not complete".to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// TenantStoreCache
// ---------------------------------------------------------------------------

/// Resolves the message store responsible for each tenant.
///
/// Guarantees at most one store (and one migration) per database identifier,
/// even when many tenants sharing an unprovisioned database resolve at once.
/// Tenants sharing a database resolve to the identical store. Mappings are
/// never evicted; under [`ProvisioningFailurePolicy::Unpublish`] a store whose
/// provisioning failed is withdrawn so it can be rebuilt.
pub struct TenantStoreCache {
    source: Arc<dyn DatabaseSource>,
    factory: MessageStoreFactory,
    initializer: StoreInitializer,
    config: TenantStoreConfig,
    cardinality: DatabaseCardinality,
    configurations: ConfigurationRegistry,
    tenants: ArcSwap<SlotMap<TenantId>>,
    databases: ArcSwap<SlotMap<DatabaseId>>,
    /// Guards check-and-publish on both maps. Never held across `.await`.
    publish_lock: Mutex<()>,
}

impl TenantStoreCache {
    /// Creates an empty cache over `source`.
    ///
    /// The source's cardinality is read once here.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyError::Store`] if `config.schema_name` is not a valid
    /// schema identifier.
    pub fn new(
        source: Arc<dyn DatabaseSource>,
        migrator: Arc<dyn SchemaMigrator>,
        runtime: Arc<MessagingRuntime>,
        config: TenantStoreConfig,
    ) -> Result<Self, TenancyError> {
        let factory = MessageStoreFactory::new(
            StoreTemplate::new(config.schema_name.clone(), config.auto_create),
            migrator,
        )?;
        let cardinality = source.cardinality();

        Ok(Self {
            source,
            factory,
            initializer: StoreInitializer::new(runtime),
            config,
            cardinality,
            configurations: ConfigurationRegistry::new(),
            tenants: ArcSwap::from_pointee(HashMap::new()),
            databases: ArcSwap::from_pointee(HashMap::new()),
            publish_lock: Mutex::new(()),
        })
    }

    /// Tenancy topology reported by the database source.
    #[must_use]
    pub fn cardinality(&self) -> DatabaseCardinality {
        self.cardinality
    }

    /// The runtime stores are registered with.
    #[must_use]
    pub fn runtime(&self) -> &Arc<MessagingRuntime> {
        self.initializer.runtime()
    }

    /// Number of stores constructed over the cache's lifetime.
    #[must_use]
    pub fn stores_constructed(&self) -> u64 {
        self.factory.created_count()
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Returns the message store responsible for `tenant`, provisioning it on
    /// first use.
    ///
    /// Never returns a store whose configuration or migration is still in
    /// flight: callers arriving mid-provisioning wait for it to settle.
    ///
    /// # Errors
    ///
    /// - [`TenancyError::Enumeration`] if the source cannot resolve the tenant
    /// - [`TenancyError::Configuration`] / [`TenancyError::Provisioning`] if
    ///   this call built the store and its setup failed
    /// - [`TenancyError::Unpublished`] if the store this call waited on was
    ///   withdrawn after a failure
    /// - [`TenancyError::Store`] if runtime registration was rejected
    pub async fn resolve(&self, tenant: &TenantId) -> Result<Arc<dyn MessageStore>, TenancyError> {
        let known = self.tenants.load().get(tenant).cloned();
        if let Some(slot) = known {
            record_resolution("hit");
            return slot.ready_store().await;
        }

        let database = self
            .source
            .resolve_or_create_database(tenant)
            .await
            .map_err(|source| TenancyError::Enumeration {
                tenant: tenant.clone(),
                source,
            })?;

        let existing = self.databases.load().get(&database.identifier).cloned();
        if let Some(slot) = existing {
            self.memoize_tenant(tenant, &slot);
            record_resolution("memoized");
            return slot.ready_store().await;
        }

        match self.claim(Some(tenant), &database)? {
            Claim::Existing(slot) => {
                record_resolution("memoized");
                slot.ready_store().await
            }
            Claim::Built(slot) => {
                let span = info_span!(
                    "provision",
                    tenant = %tenant,
                    database = %database.identifier
                );
                self.finish_provisioning(&slot, self.config.auto_create)
                    .instrument(span)
                    .await?;
                record_resolution("provisioned");
                Ok(slot.store())
            }
        }
    }

    /// Maps `tenant` onto an already published store.
    fn memoize_tenant(&self, tenant: &TenantId, slot: &Arc<StoreSlot>) {
        let _guard = self.publish_lock.lock();
        let still_published = self
            .databases
            .load()
            .get(slot.database())
            .is_some_and(|current| Arc::ptr_eq(current, slot));
        if still_published && !self.tenants.load().contains_key(tenant) {
            self.insert_tenant(tenant.clone(), slot);
            debug!(
                tenant = %tenant,
                database = %slot.database(),
                "tenant mapped to existing store"
            );
        }
    }

    /// The critical section: re-check both maps, otherwise construct,
    /// register and publish a store for `database`.
    fn claim(
        &self,
        tenant: Option<&TenantId>,
        database: &DatabaseHandle,
    ) -> Result<Claim, TenancyError> {
        let _guard = self.publish_lock.lock();

        if let Some(tenant) = tenant {
            if let Some(slot) = self.tenants.load().get(tenant) {
                return Ok(Claim::Existing(Arc::clone(slot)));
            }
        }

        let existing = self.databases.load().get(&database.identifier).cloned();
        if let Some(slot) = existing {
            if let Some(tenant) = tenant {
                self.insert_tenant(tenant.clone(), &slot);
            }
            return Ok(Claim::Existing(slot));
        }

        let store = self.factory.create(database);
        self.initializer.register(&store)?;
        let slot = Arc::new(StoreSlot::new(database.identifier.clone(), store));

        let mut databases = (**self.databases.load()).clone();
        databases.insert(database.identifier.clone(), Arc::clone(&slot));
        self.databases.store(Arc::new(databases));
        if let Some(tenant) = tenant {
            self.insert_tenant(tenant.clone(), &slot);
        }

        metrics::counter!("postbox_stores_provisioned_total").increment(1);
        info!(
            database = %database.identifier,
            store = slot.store().name(),
            "message store published"
        );
        Ok(Claim::Built(slot))
    }

    /// Must be called with `publish_lock` held.
    fn insert_tenant(&self, tenant: TenantId, slot: &Arc<StoreSlot>) {
        let mut tenants = (**self.tenants.load()).clone();
        tenants.insert(tenant, Arc::clone(slot));
        self.tenants.store(Arc::new(tenants));
    }

    /// Applies pending configuration actions, then migrates under `policy`.
    /// Runs outside the critical section.
    ///
    /// If this future is dropped or unwinds before the slot settles, the
    /// failure policy is applied as if provisioning had failed.
    async fn finish_provisioning(
        &self,
        slot: &Arc<StoreSlot>,
        policy: AutoCreate,
    ) -> Result<(), TenancyError> {
        let _settle_on_drop = ProvisioningGuard { cache: self, slot };
        let store = slot.store();
        let outcome = match slot.apply_pending(&self.configurations).await {
            Ok(()) => self
                .initializer
                .provision(&store, policy)
                .await
                .map(|_| ())
                .map_err(|source| TenancyError::Provisioning {
                    store: store.name().to_string(),
                    source,
                }),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                slot.mark(Readiness::Ready);
                Ok(())
            }
            Err(err) => {
                self.settle_failed(slot, err.to_string());
                Err(err)
            }
        }
    }

    /// Moves a slot out of `Provisioning` according to the failure policy.
    fn settle_failed(&self, slot: &Arc<StoreSlot>, reason: String) {
        let store = slot.store();
        match self.config.failure_policy {
            ProvisioningFailurePolicy::LeavePublished => {
                warn!(
                    store = store.name(),
                    error = %reason,
                    "store left published after failed provisioning"
                );
                slot.mark(Readiness::Failed(reason));
            }
            ProvisioningFailurePolicy::Unpublish => {
                self.unpublish(slot);
                warn!(
                    store = store.name(),
                    error = %reason,
                    "store unpublished after failed provisioning"
                );
                slot.mark(Readiness::Unpublished(reason));
            }
        }
    }

    /// Withdraws `slot` from both maps and from the runtime.
    fn unpublish(&self, slot: &Arc<StoreSlot>) {
        let _guard = self.publish_lock.lock();

        let mut databases = (**self.databases.load()).clone();
        databases.retain(|_, current| !Arc::ptr_eq(current, slot));
        self.databases.store(Arc::new(databases));

        let mut tenants = (**self.tenants.load()).clone();
        tenants.retain(|_, current| !Arc::ptr_eq(current, slot));
        self.tenants.store(Arc::new(tenants));

        self.initializer.unregister(&slot.store());
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Provisions every database the source knows about that the cache has
    /// not seen yet. Tenant mappings are left alone.
    ///
    /// Migration uses the runtime's `auto_build_message_storage_on_startup`
    /// policy. Idempotent: with no new databases nothing is constructed.
    ///
    /// # Errors
    ///
    /// [`TenancyError::Discovery`] if enumeration fails; otherwise the first
    /// provisioning failure, which aborts the sweep. Stores provisioned
    /// earlier in the sweep stay published.
    pub async fn refresh(&self) -> Result<(), TenancyError> {
        let databases = self
            .source
            .all_databases()
            .await
            .map_err(TenancyError::Discovery)?;
        let policy = self
            .runtime()
            .options()
            .auto_build_message_storage_on_startup;

        let mut provisioned = 0_usize;
        for database in databases {
            if self.databases.load().contains_key(&database.identifier) {
                continue;
            }
            if let Claim::Built(slot) = self.claim(None, &database)? {
                self.finish_provisioning(&slot, policy)
                    .instrument(info_span!("provision", database = %database.identifier))
                    .await?;
                provisioned += 1;
            }
        }

        debug!(provisioned, known = self.databases.load().len(), "refresh complete");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Enumeration & configuration
    // -----------------------------------------------------------------------

    /// Snapshot of every published store, one per database.
    #[must_use]
    pub fn all_active(&self) -> Vec<Arc<dyn MessageStore>> {
        self.databases
            .load()
            .values()
            .map(|slot| slot.store())
            .collect()
    }

    /// Snapshot of every tenant mapping resolved so far.
    #[must_use]
    pub fn all_active_by_tenant(&self) -> Vec<(TenantId, Arc<dyn MessageStore>)> {
        self.tenants
            .load()
            .iter()
            .map(|(tenant, slot)| (tenant.clone(), slot.store()))
            .collect()
    }

    /// Provisioning state of the store published for `database`, if any.
    #[must_use]
    pub fn readiness(&self, database: &DatabaseId) -> Option<Readiness> {
        self.databases.load().get(database).map(|slot| slot.readiness())
    }

    /// Registers `action` for every store and applies it to the stores that
    /// already exist. Stores created later receive it during provisioning,
    /// after previously registered actions.
    ///
    /// # Errors
    ///
    /// [`TenancyError::Configuration`] for the first store the action (or an
    /// earlier pending one) fails on. Remaining stores are not visited; they
    /// pick the action up on their next application pass.
    pub async fn register_configuration(
        &self,
        action: Arc<dyn StoreConfiguration>,
    ) -> Result<(), TenancyError> {
        let position = self.configurations.push(action);
        debug!(position, "configuration registered");

        let slots: Vec<Arc<StoreSlot>> = self.databases.load().values().cloned().collect();
        for slot in slots {
            slot.apply_pending(&self.configurations).await?;
        }
        Ok(())
    }

    /// Diagnostic description of the cache.
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let mut stores: Vec<String> = self
            .all_active()
            .iter()
            .map(|store| store.name().to_string())
            .collect();
        stores.sort();

        serde_json::json!({
            "cardinality": self.cardinality,
            "schema_name": self.config.schema_name,
            "auto_create": self.config.auto_create,
            "failure_policy": format!("{:?}", self.config.failure_policy),
            "configurations": self.configurations.len(),
            "stores": stores,
            "tenants": self.tenants.load().len(),
        })
    }
}

fn record_resolution(outcome: &'static str) {
    metrics::counter!("postbox_tenant_resolutions_total", "outcome" => outcome).increment(1);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
