//! Healing wrappers around a live page
//!
//! Every action goes to the original locator first. When it fails the
//! healer is asked for a replacement and the same action is replayed on it.

use std::sync::Arc;

use selfheal_core_types::AriaRole;
use tracing::{info, warn};

use crate::driver::{LiveLocator, LivePage, LiveQuery, LocatorAction};
use crate::errors::{HealError, LocatorError};
use crate::healer::SelfHealer;

#[derive(Clone)]
pub struct HealingPage {
    page: Arc<dyn LivePage>,
    healer: Arc<dyn SelfHealer>,
}

impl HealingPage {
    pub fn new(page: Arc<dyn LivePage>, healer: Arc<dyn SelfHealer>) -> Self {
        Self { page, healer }
    }

    pub fn page(&self) -> &Arc<dyn LivePage> {
        &self.page
    }

    pub fn get_by_role(
        &self,
        role: AriaRole,
        name: impl Into<String>,
        exact: bool,
    ) -> Result<HealingLocator, LocatorError> {
        self.wrap(LiveQuery::Role {
            role,
            name: name.into(),
            exact,
        })
    }

    pub fn get_by_text(
        &self,
        text: impl Into<String>,
        exact: bool,
    ) -> Result<HealingLocator, LocatorError> {
        self.wrap(LiveQuery::Text {
            text: text.into(),
            exact,
        })
    }

    pub fn get_by_label(
        &self,
        text: impl Into<String>,
        exact: bool,
    ) -> Result<HealingLocator, LocatorError> {
        self.wrap(LiveQuery::Label {
            text: text.into(),
            exact,
        })
    }

    pub fn get_by_placeholder(
        &self,
        text: impl Into<String>,
        exact: bool,
    ) -> Result<HealingLocator, LocatorError> {
        self.wrap(LiveQuery::Placeholder {
            text: text.into(),
            exact,
        })
    }

    pub fn get_by_test_id(&self, id: impl Into<String>) -> Result<HealingLocator, LocatorError> {
        self.wrap(LiveQuery::TestId { id: id.into() })
    }

    pub fn locator(&self, selector: impl Into<String>) -> Result<HealingLocator, LocatorError> {
        self.wrap(LiveQuery::Selector {
            selector: selector.into(),
        })
    }

    fn wrap(&self, query: LiveQuery) -> Result<HealingLocator, LocatorError> {
        let inner = self.page.locate(&query)?;
        Ok(HealingLocator {
            query,
            inner,
            page: Arc::clone(&self.page),
            healer: Arc::clone(&self.healer),
        })
    }
}

pub struct HealingLocator {
    query: LiveQuery,
    inner: Box<dyn LiveLocator>,
    page: Arc<dyn LivePage>,
    healer: Arc<dyn SelfHealer>,
}

impl HealingLocator {
    pub fn query(&self) -> &LiveQuery {
        &self.query
    }

    pub async fn perform(&self, action: LocatorAction) -> Result<(), HealError> {
        let failure = match self.inner.perform(&action).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        warn!(
            target: "proxy",
            locator = %self.query.describe(),
            action = action.name(),
            error = %failure,
            "action failed, attempting heal"
        );

        let healed = self.healer.heal(self.page.as_ref(), failure).await?;
        healed.perform(&action).await.map_err(HealError::Retry)?;
        info!(target: "proxy", action = action.name(), "action succeeded on healed locator");
        Ok(())
    }

    pub async fn click(&self) -> Result<(), HealError> {
        self.perform(LocatorAction::Click).await
    }

    pub async fn fill(&self, value: impl Into<String>) -> Result<(), HealError> {
        self.perform(LocatorAction::Fill(value.into())).await
    }
}
