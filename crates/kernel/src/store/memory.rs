//! In-process store for tests and local runs without PostgreSQL.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{CatalogStore, ContentStore, ListingStore, ReportStore, Store, StoreError, UserStore};
use crate::listing::{EngagementIndex, Predicate, SortSpec, Viewer, Window};
use crate::models::report::REPORT_STATUS_PENDING;
use crate::models::{
    AuthorRecord, EngagementEdge, Item, ItemChanges, ItemKind, ItemRecord, Lecturer, NewItem,
    NewReport, ParentRecord, Report, Role, SiteStats, Subject, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    subjects: HashMap<Uuid, Subject>,
    lecturers: HashMap<Uuid, Lecturer>,
    items: Vec<Item>,
    edges: HashSet<EngagementEdge>,
    reports: Vec<Report>,
}

impl Tables {
    fn find(&self, kind: ItemKind, id: Uuid) -> Option<&Item> {
        self.items.iter().find(|i| i.kind == kind && i.id == id)
    }

    fn author(&self, id: Uuid) -> AuthorRecord {
        match self.users.get(&id) {
            Some(user) => AuthorRecord {
                id,
                name: user.name.clone(),
                image: user.image.clone(),
            },
            None => AuthorRecord {
                id,
                name: String::new(),
                image: None,
            },
        }
    }

    fn parent(&self, item: &Item) -> Option<ParentRecord> {
        let parent = match (item.reply_to_id, item.forum_id) {
            (Some(id), _) => self.find(ItemKind::Review, id)?,
            (None, Some(id)) => self.find(ItemKind::Forum, id)?,
            (None, None) => return None,
        };
        Some(ParentRecord {
            kind: parent.kind,
            id: parent.id,
            title: parent.title.clone(),
            body: parent.body.clone(),
            created_at: parent.created_at,
            author: self.author(parent.author_id),
            is_anonymous: parent.is_anonymous,
        })
    }

    fn record(&self, item: &Item, index: &EngagementIndex<'_>, viewer: &Viewer) -> ItemRecord {
        let subject = item.subject_id.and_then(|id| self.subjects.get(&id));
        let lecturer = item.lecturer_id.and_then(|id| self.lecturers.get(&id));

        ItemRecord {
            kind: item.kind,
            id: item.id,
            author: self.author(item.author_id),
            subject_id: item.subject_id,
            subject_name: subject.map(|s| s.name.clone()),
            semester: subject.and_then(|s| s.semester),
            lecturer_id: item.lecturer_id,
            lecturer_name: lecturer.map(|l| l.name.clone()),
            reply_to_id: item.reply_to_id,
            forum_id: item.forum_id,
            title: item.title.clone(),
            body: item.body.clone(),
            files: item.files.clone(),
            is_anonymous: item.is_anonymous,
            created_at: item.created_at,
            updated_at: item.updated_at,
            parent: self.parent(item),
            aggregates: index.project(item.kind, item.id, viewer),
        }
    }

    fn matching(
        &self,
        kind: ItemKind,
        predicate: &Predicate,
        viewer: &Viewer,
    ) -> Vec<ItemRecord> {
        let index = EngagementIndex::build(&self.edges, &self.items);
        self.items
            .iter()
            .filter(|item| item.kind == kind)
            .map(|item| self.record(item, &index, viewer))
            .filter(|record| predicate.matches(record, &index))
            .collect()
    }
}

/// Store backed by in-process collections.
///
/// Every `fetch` and `count` is counted so tests can assert how many list
/// queries a request issued.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    queries: AtomicUsize,
    healthy: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            queries: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.tables.write().users.insert(user.id, user);
    }

    pub fn insert_subject(&self, subject: Subject) {
        self.tables.write().subjects.insert(subject.id, subject);
    }

    pub fn insert_lecturer(&self, lecturer: Lecturer) {
        self.tables.write().lecturers.insert(lecturer.id, lecturer);
    }

    /// Insert an item as-is, keeping its id and timestamps.
    pub fn insert_item(&self, item: Item) {
        self.tables.write().items.push(item);
    }

    pub fn insert_edge(&self, edge: EngagementEdge) {
        self.tables.write().edges.insert(edge);
    }

    /// Number of list queries (`fetch` or `count`) executed so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn fetch(
        &self,
        kind: ItemKind,
        predicate: &Predicate,
        sort: &SortSpec,
        window: Option<Window>,
        viewer: &Viewer,
    ) -> Result<Vec<ItemRecord>> {
        self.record_query();
        let mut rows = self.tables.read().matching(kind, predicate, viewer);
        rows.sort_by(|a, b| sort.compare(a, b));

        if let Some(window) = window {
            let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
            let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
            rows = rows.into_iter().skip(offset).take(limit).collect();
        }

        Ok(rows)
    }

    async fn count(&self, kind: ItemKind, predicate: &Predicate) -> Result<u64> {
        self.record_query();
        let rows = self
            .tables
            .read()
            .matching(kind, predicate, &Viewer::anonymous());
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_item(&self, input: NewItem) -> Result<Item> {
        let mut tables = self.tables.write();
        let parent_missing = input
            .reply_to_id
            .is_some_and(|id| tables.find(ItemKind::Review, id).is_none())
            || input
                .forum_id
                .is_some_and(|id| tables.find(ItemKind::Forum, id).is_none());
        if parent_missing {
            return Err(StoreError::MissingReference.into());
        }

        let now = Utc::now();
        let item = Item {
            kind: input.kind,
            id: Uuid::now_v7(),
            author_id: input.author_id,
            subject_id: input.subject_id,
            lecturer_id: input.lecturer_id,
            reply_to_id: input.reply_to_id,
            forum_id: input.forum_id,
            title: input.title,
            body: input.body,
            files: input.files,
            is_anonymous: input.is_anonymous,
            created_at: now,
            updated_at: now,
        };
        tables.items.push(item.clone());
        Ok(item)
    }

    async fn find_item(&self, kind: ItemKind, id: Uuid) -> Result<Option<Item>> {
        Ok(self.tables.read().find(kind, id).cloned())
    }

    async fn update_item(
        &self,
        kind: ItemKind,
        id: Uuid,
        changes: ItemChanges,
    ) -> Result<Option<Item>> {
        let mut tables = self.tables.write();
        let Some(item) = tables
            .items
            .iter_mut()
            .find(|i| i.kind == kind && i.id == id)
        else {
            return Ok(None);
        };
        changes.apply(item, Utc::now());
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, kind: ItemKind, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.find(kind, id).is_none() {
            return Ok(false);
        }

        // Collect the item and every reply below it
        let mut doomed = vec![(kind, id)];
        let mut next = 0;
        while next < doomed.len() {
            let (parent_kind, parent_id) = doomed[next];
            for item in &tables.items {
                let child = match parent_kind {
                    ItemKind::Review => item.reply_to_id == Some(parent_id),
                    ItemKind::Forum => item.forum_id == Some(parent_id),
                };
                if child && !doomed.contains(&(item.kind, item.id)) {
                    doomed.push((item.kind, item.id));
                }
            }
            next += 1;
        }

        tables
            .items
            .retain(|item| !doomed.contains(&(item.kind, item.id)));
        tables
            .edges
            .retain(|edge| !doomed.contains(&(edge.item_kind, edge.item_id)));
        tables.reports.retain(|report| {
            report
                .review_id
                .is_none_or(|review| !doomed.contains(&(ItemKind::Review, review)))
        });

        Ok(true)
    }

    async fn add_engagement(&self, edge: EngagementEdge) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.find(edge.item_kind, edge.item_id).is_none() {
            return Err(StoreError::MissingReference.into());
        }
        Ok(tables.edges.insert(edge))
    }

    async fn remove_engagement(&self, edge: EngagementEdge) -> Result<bool> {
        Ok(self.tables.write().edges.remove(&edge))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_user(&self, user: User) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.users.get_mut(&user.id) {
            Some(existing) => {
                existing.name = user.name;
                existing.email = user.email;
            }
            None => {
                tables.users.insert(user.id, user);
            }
        }
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.tables.read().users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn toggle_ban(&self, id: Uuid) -> Result<Option<User>> {
        let mut tables = self.tables.write();
        Ok(tables.users.get_mut(&id).map(|user| {
            user.is_banned = !user.is_banned;
            user.clone()
        }))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>> {
        let mut tables = self.tables.write();
        Ok(tables.users.get_mut(&id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let mut subjects: Vec<Subject> = self.tables.read().subjects.values().cloned().collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn list_lecturers(&self) -> Result<Vec<Lecturer>> {
        let mut lecturers: Vec<Lecturer> =
            self.tables.read().lecturers.values().cloned().collect();
        lecturers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lecturers)
    }

    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>> {
        Ok(self.tables.read().subjects.get(&id).cloned())
    }

    async fn find_lecturer(&self, id: Uuid) -> Result<Option<Lecturer>> {
        Ok(self.tables.read().lecturers.get(&id).cloned())
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn create_report(&self, reporter_id: Uuid, input: NewReport) -> Result<Report> {
        let report = Report {
            id: Uuid::now_v7(),
            reporter_id,
            review_id: input.id_review,
            lecturer_id: input.id_lecturer,
            report_type: input.report_type,
            body: input.body,
            status: REPORT_STATUS_PENDING.to_string(),
            created_at: Utc::now(),
        };
        self.tables.write().reports.push(report.clone());
        Ok(report)
    }

    async fn reports_by(&self, reporter_id: Uuid) -> Result<Vec<Report>> {
        let mut reports: Vec<Report> = self
            .tables
            .read()
            .reports
            .iter()
            .filter(|r| r.reporter_id == reporter_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn stats(&self) -> Result<SiteStats> {
        let tables = self.tables.read();
        let items_of =
            |kind: ItemKind| tables.items.iter().filter(|i| i.kind == kind).count() as u64;

        Ok(SiteStats {
            total_users: tables.users.len() as u64,
            total_reviews: items_of(ItemKind::Review),
            total_forums: items_of(ItemKind::Forum),
            pending_reports: tables
                .reports
                .iter()
                .filter(|r| r.status == REPORT_STATUS_PENDING)
                .count() as u64,
        })
    }
}
