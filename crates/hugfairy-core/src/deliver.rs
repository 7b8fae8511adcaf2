//! Per-run delivery driver.
//!
//! Sequential, fatal on the first error: enumerate recipients, render a
//! reply for each, publish it. The pending cursor marker is committed only
//! after every send succeeded, so a mid-run failure leaves the stored marker
//! where it was and the next run re-sees the unanswered posts.

use crate::agent::{PostIndex, PostOutbox};
use crate::cursor::CursorStore;
use crate::error::Result;
use crate::search::HandleEnumerator;
use crate::template::{Selector, TemplateSet};
use tracing::{info, warn};

/// One delivery pass over the new posts behind the configured tag
pub struct Delivery<'a, C: PostIndex + PostOutbox> {
    client: &'a C,
    templates: &'a TemplateSet,
    selector: Selector,
    cursor: &'a CursorStore,
    tag: String,
    page_limit: u8,
    dry_run: bool,
}

/// Outcome of a completed delivery pass
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    /// Replies actually published
    pub sent: usize,
    /// Marker committed to the cursor store, when one was
    pub committed_marker: Option<String>,
}

impl<'a, C: PostIndex + PostOutbox> Delivery<'a, C> {
    pub fn new(
        client: &'a C,
        templates: &'a TemplateSet,
        selector: Selector,
        cursor: &'a CursorStore,
        tag: impl Into<String>,
        page_limit: u8,
    ) -> Self {
        Self {
            client,
            templates,
            selector,
            cursor,
            tag: tag.into(),
            page_limit,
            dry_run: false,
        }
    }

    /// Render and print replies without publishing or committing the cursor
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Run the pass to completion or to the first failed send
    pub async fn run(&self) -> Result<DeliveryReport> {
        let stop_marker = self.cursor.load()?;
        let mut recipients =
            HandleEnumerator::new(self.client, self.tag.clone(), self.page_limit, stop_marker);

        let mut sent = 0;
        while let Some(recipient) = recipients.next().await? {
            let (text, facets) =
                self.templates
                    .generate(self.selector, &recipient.handle, &recipient.did);
            println!("{} {}", recipient.handle, recipient.did);

            if self.dry_run {
                println!("  would post: {text}");
                continue;
            }

            let record = self.client.publish(&text, facets).await?;
            info!("Published {}", record.uri);
            sent += 1;
        }

        if self.dry_run {
            return Ok(DeliveryReport {
                sent,
                committed_marker: None,
            });
        }

        // All sends confirmed; durable progress may advance now
        let committed_marker = match recipients.pending_marker() {
            Some(marker) => {
                self.cursor.save(marker)?;
                Some(marker.to_string())
            }
            None => {
                warn!("Search returned no posts; cursor left untouched");
                None
            }
        };

        Ok(DeliveryReport {
            sent,
            committed_marker,
        })
    }
}
