//! Scope algebra: which rows a table handle admits by default.
//!
//! A [`Scope`] is the pair of visibility axes every view is named after.
//! It is turned into a concrete [`Filter`] *per call*, never memoized,
//! because the current tenant can change between calls on the same handle.

use rowscope_tenancy::NoTenantSet;

use crate::column::{SOFT_DELETED_AT, TENANT_ID, TableSpec};
use crate::filter::Filter;

/// Visibility along the soft-delete axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDeleteVisibility {
    /// Rows whose marker is NULL.
    Live,
    /// Rows whose marker is set.
    SoftDeleted,
    /// Both. Contributes no predicate at all.
    All,
}

/// Visibility along the tenant axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantVisibility {
    /// Rows owned by the current tenant binding.
    CurrentTenant,
    /// Every tenant's rows. Contributes no predicate at all — escaping the
    /// tenant concern means omitting the filter, never weakening it.
    AllTenants,
}

/// The two visibility axes a view is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    soft_delete: SoftDeleteVisibility,
    tenant: TenantVisibility,
}

impl Scope {
    #[must_use]
    pub fn new(soft_delete: SoftDeleteVisibility, tenant: TenantVisibility) -> Self {
        Self {
            soft_delete,
            tenant,
        }
    }

    /// The strip-scope: admits every row. For maintenance and tests, not
    /// the ordinary read path.
    #[must_use]
    pub fn everything() -> Self {
        Self::new(SoftDeleteVisibility::All, TenantVisibility::AllTenants)
    }

    #[must_use]
    pub fn soft_delete(self) -> SoftDeleteVisibility {
        self.soft_delete
    }

    #[must_use]
    pub fn tenant(self) -> TenantVisibility {
        self.tenant
    }

    /// Build the predicate this scope applies to `spec`, from table state at
    /// call time.
    ///
    /// An axis contributes a predicate only when the table declares the
    /// matching capability column; a table without a tenant column is not
    /// tenant-filtered no matter the axis.
    ///
    /// # Errors
    ///
    /// Returns [`NoTenantSet`] when the tenant predicate is required but no
    /// current tenant is bound — never silently matching nothing or
    /// everything.
    pub fn filter(self, spec: &TableSpec) -> Result<Filter, NoTenantSet> {
        let mut filter = Filter::All;

        if spec.soft_delete_col().is_some() {
            filter = match self.soft_delete {
                SoftDeleteVisibility::Live => filter.and(Filter::is_null(SOFT_DELETED_AT)),
                SoftDeleteVisibility::SoftDeleted => {
                    filter.and(Filter::is_not_null(SOFT_DELETED_AT))
                }
                SoftDeleteVisibility::All => filter,
            };
        }

        if spec.tenant_col().is_some() && self.tenant == TenantVisibility::CurrentTenant {
            filter = filter.and(Filter::eq(TENANT_ID, rowscope_tenancy::current_tenant_id()?));
        }

        Ok(filter)
    }
}

/// Live rows of the current tenant — the default everywhere.
impl Default for Scope {
    fn default() -> Self {
        Self::new(SoftDeleteVisibility::Live, TenantVisibility::CurrentTenant)
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let soft_delete = match self.soft_delete {
            SoftDeleteVisibility::Live => "live",
            SoftDeleteVisibility::SoftDeleted => "soft_deleted",
            SoftDeleteVisibility::All => "all",
        };
        let tenant = match self.tenant {
            TenantVisibility::CurrentTenant => "current_tenant",
            TenantVisibility::AllTenants => "all_tenants",
        };
        write!(f, "{soft_delete}/{tenant}")
    }
}
