//! Report pipelines: fetch, extract, normalize, aggregate, assemble.
//!
//! Fetches are issued one at a time. In multi-entity reports a failure
//! that concerns one entity is logged and leaves that entity's record
//! empty; only errors that are not entity-scoped abort the report.

use crate::aggregate::{KeyedCollection, LikeCollection, Merge, PostCollection, PresenceLog};
use crate::assemble::Assembler;
use crate::config::ScraperConfig;
use crate::error::ScrapeResult;
use crate::extract::{
    extract, parse_presence, AboutSelector, FriendsSelector, LikersSelector,
    MutualFriendsSelector, PageSelector, RawFriendPage, RawTimeline, TimelineSelector,
};
use crate::http::PageSource;
use crate::model::{FriendEntry, LikeEvent, ProfileFields};
use crate::normalize::{normalize_about, normalize_article, normalize_friends};
use crate::snapshot;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Upper bound on pages followed through one pagination chain.
const MAX_PAGES: usize = 500;

pub struct Scraper<S> {
    config: ScraperConfig,
    source: S,
    now: NaiveDateTime,
}

impl<S: PageSource> Scraper<S> {
    pub fn new(config: ScraperConfig, source: S) -> Self {
        Self {
            config,
            source,
            now: chrono::Local::now().naive_local(),
        }
    }

    /// Reference time for relative display dates such as `3 hrs`.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The logged-in account's friends, `{uid: {name}}`.
    pub async fn friends(&mut self) -> ScrapeResult<KeyedCollection<FriendEntry>> {
        let start = self.config.friends_url();
        self.friend_pages(start, &FriendsSelector::new()).await
    }

    /// Mutual friends between the account and `key`.
    pub async fn mutual_friends(&mut self, key: &str) -> ScrapeResult<KeyedCollection<FriendEntry>> {
        let start = self.config.mutual_friends_url(key);
        self.friend_pages(start, &MutualFriendsSelector).await
    }

    async fn friend_pages<P>(
        &mut self,
        start: String,
        selector: &P,
    ) -> ScrapeResult<KeyedCollection<FriendEntry>>
    where
        P: PageSelector<Output = RawFriendPage>,
    {
        let mut friends = KeyedCollection::new();
        let mut visited = HashSet::new();
        let mut next = Some(start);

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) || visited.len() > MAX_PAGES {
                tracing::warn!("stopping pagination at {url}");
                break;
            }
            let markup = self.source.fetch(&url).await?;
            let page = extract(&markup, selector)?;
            tracing::debug!(page = P::PAGE, found = page.friends.len(), "friend page");

            for (key, entry) in normalize_friends(&page) {
                friends.insert_new(key, entry);
            }
            next = page.next.map(|href| self.config.absolute(&href));
        }
        tracing::info!(page = P::PAGE, total = friends.len(), "collected friends");
        Ok(friends)
    }

    /// Profile fields from the about page of `key`.
    pub async fn profile(&mut self, key: &str) -> ScrapeResult<ProfileFields> {
        let url = self.config.about_url(key);
        let markup = self.source.fetch(&url).await?;
        let raw = extract(&markup, &AboutSelector::new())?;
        normalize_about(&raw)
    }

    /// About-page records for each key, in input order.
    ///
    /// Keys that cannot be resolved map to `{}`.
    pub async fn friend_details(
        &mut self,
        keys: &[String],
        include_mutual: bool,
    ) -> ScrapeResult<Value> {
        let mut assembler = Assembler::new();

        for key in keys {
            assembler.request(key);
            tracing::info!(entity = %key, "fetching details");

            match self.profile(key).await {
                Ok(fields) => assembler.absorb_record(key, &fields)?,
                Err(e) if e.is_entity_scoped() => {
                    assembler.unavailable(key, &e);
                    continue;
                }
                Err(e) => return Err(e),
            }

            if include_mutual {
                match self.mutual_friends(key).await {
                    Ok(mutual) => {
                        assembler.set_field(key, "mutual_friends", serde_json::to_value(&mutual)?)
                    }
                    Err(e) if e.is_entity_scoped() => {
                        tracing::warn!(entity = %key, "mutual friends unavailable: {e}");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(assembler.finish())
    }

    /// All posts on the timeline of `key`: the landing page, then every year
    /// section, each followed through its "Show more" chain.
    pub async fn timeline(&mut self, key: &str) -> ScrapeResult<PostCollection> {
        let selector = TimelineSelector::new();
        let mut posts = PostCollection::new();
        let mut visited = HashSet::new();

        let landing_url = self.config.timeline_url(key);
        visited.insert(landing_url.clone());
        let markup = self.source.fetch(&landing_url).await?;
        let landing = extract(&markup, &selector)?;
        let year_links = landing.year_links.clone();
        self.follow_timeline(landing, &selector, &mut posts, &mut visited)
            .await?;

        for href in year_links {
            let url = self.config.absolute(&href);
            if !visited.insert(url.clone()) {
                continue;
            }
            let page = match self.fetch_timeline(&url, &selector).await {
                Ok(page) => page,
                Err(e) if e.is_entity_scoped() => {
                    tracing::warn!(entity = key, "skipping timeline section {url}: {e}");
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.follow_timeline(page, &selector, &mut posts, &mut visited)
                .await?;
        }

        tracing::info!(entity = key, posts = posts.len(), "collected timeline");
        Ok(posts)
    }

    async fn fetch_timeline(
        &mut self,
        url: &str,
        selector: &TimelineSelector,
    ) -> ScrapeResult<RawTimeline> {
        let markup = self.source.fetch(url).await?;
        extract(&markup, selector)
    }

    /// Absorb a timeline page's posts and walk its "Show more" chain.
    async fn follow_timeline(
        &mut self,
        mut page: RawTimeline,
        selector: &TimelineSelector,
        posts: &mut PostCollection,
        visited: &mut HashSet<String>,
    ) -> ScrapeResult<()> {
        for _ in 0..MAX_PAGES {
            let mut incoming = PostCollection::new();
            for article in &page.articles {
                match normalize_article(article, self.now) {
                    Ok(post) => {
                        incoming.add(post);
                    }
                    Err(e) => tracing::warn!("skipping post: {e}"),
                }
            }
            posts.merge(incoming);

            let Some(url) = page.show_more.take().map(|href| self.config.absolute(&href)) else {
                return Ok(());
            };
            if !visited.insert(url.clone()) {
                return Ok(());
            }
            page = match self.fetch_timeline(&url, selector).await {
                Ok(page) => page,
                Err(e) if e.is_entity_scoped() => {
                    tracing::warn!("timeline chain ended at {url}: {e}");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
        }
        tracing::warn!("timeline chain exceeded {MAX_PAGES} pages");
        Ok(())
    }

    /// Who liked the posts on the timeline of `key`, grouped by liker.
    pub async fn likes(&mut self, key: &str) -> ScrapeResult<LikeCollection> {
        let posts = self.timeline(key).await?;
        let selector = LikersSelector;
        let mut likes = LikeCollection::new();

        for post in posts.posts() {
            let event = LikeEvent {
                post_id: post.id,
                timestamp: post.timestamp,
            };
            let mut next = Some(self.config.likers_url(post.id));
            let mut pages = 0;

            while let Some(url) = next.take() {
                pages += 1;
                if pages > MAX_PAGES {
                    break;
                }
                let page = match self.source.fetch(&url).await {
                    Ok(markup) => extract(&markup, &selector),
                    Err(e) => Err(e),
                };
                let page = match page {
                    Ok(page) => page,
                    Err(e) if e.is_entity_scoped() => {
                        tracing::warn!(post = post.id, "likers unavailable: {e}");
                        break;
                    }
                    Err(e) => return Err(e),
                };
                for liker in &page.likers {
                    likes.add(liker, event.clone());
                }
                next = page.next.map(|href| self.config.absolute(&href));
            }
        }

        tracing::info!(entity = key, likers = likes.len(), "collected likes");
        Ok(likes)
    }

    /// One presence poll: fetch, merge into `log`, and persist the snapshot
    /// when something new was observed. Returns whether `log` changed.
    pub async fn poll_presence(
        &mut self,
        log: &mut PresenceLog,
        snapshot_path: Option<&Path>,
    ) -> ScrapeResult<bool> {
        let url = self.config.presence_url();
        let body = self.source.fetch_fresh(&url).await?;
        let incoming: PresenceLog = parse_presence(&body)?.into_iter().collect();

        let changed = log.merge(incoming);
        if changed {
            tracing::info!(entities = log.len(), "new presence observed");
            if let Some(path) = snapshot_path {
                snapshot::persist(path, log)?;
            }
        } else {
            tracing::debug!("no new presence");
        }
        Ok(changed)
    }
}
