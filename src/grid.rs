//! Grid session: ties descriptors, dynamic columns, view state and providers
//! together for one view.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::column::catalog::{
    DEFAULT_SELECTED_COLUMNS, PINNED_COLUMNS, THREADS_VIEW_KEY, feedback_scores_spec,
    thread_columns, thread_filter_columns,
};
use crate::column::{DerivationCache, DescriptorSet, DynamicColumnSpec, RegistryError, register};
use crate::config::GridConfig;
use crate::export::{ExportTable, export_columns};
use crate::filter::{Filter, FilterError, validate_all};
use crate::materialize::{MaterializedColumn, materialize};
use crate::model::Record;
use crate::provider::{NameProvider, PageRequest, ProviderError, RecordPage, RecordProvider};
use crate::storage::{StoreError, ViewDefaults, ViewKey, ViewStateStore};
use crate::view::{PageWindow, RowCursor, RowHeight, SortSpec, ViewState, ViewStateError};

#[derive(Debug)]
pub enum GridError {
    Registry(RegistryError),
    ViewState(ViewStateError),
    Filter(FilterError),
    Store(StoreError),
    Provider(ProviderError),
    Io(std::io::Error),
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::Registry(e) => write!(f, "column registry: {}", e),
            GridError::ViewState(e) => write!(f, "view state: {}", e),
            GridError::Filter(e) => write!(f, "filter: {}", e),
            GridError::Store(e) => write!(f, "view store: {}", e),
            GridError::Provider(e) => write!(f, "provider: {}", e),
            GridError::Io(e) => write!(f, "output: {}", e),
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridError::Registry(e) => Some(e),
            GridError::ViewState(e) => Some(e),
            GridError::Filter(e) => Some(e),
            GridError::Store(e) => Some(e),
            GridError::Provider(e) => Some(e),
            GridError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        GridError::Io(err)
    }
}

impl From<RegistryError> for GridError {
    fn from(err: RegistryError) -> Self {
        GridError::Registry(err)
    }
}

impl From<ViewStateError> for GridError {
    fn from(err: ViewStateError) -> Self {
        GridError::ViewState(err)
    }
}

impl From<FilterError> for GridError {
    fn from(err: FilterError) -> Self {
        GridError::Filter(err)
    }
}

impl From<StoreError> for GridError {
    fn from(err: StoreError) -> Self {
        GridError::Store(err)
    }
}

impl From<ProviderError> for GridError {
    fn from(err: ProviderError) -> Self {
        GridError::Provider(err)
    }
}

/// One rendered row: cells follow the order of [`GridFrame::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub id: String,
    pub cells: Vec<String>,
}

/// Everything a renderer needs for one pass over the grid.
#[derive(Debug, Clone)]
pub struct GridFrame {
    pub columns: Vec<MaterializedColumn>,
    pub rows: Vec<GridRow>,
    pub window: PageWindow,
    pub row_height: RowHeight,
}

impl GridFrame {
    /// Columns an export of this page writes, in display order.
    pub fn export_columns(&self) -> impl Iterator<Item = &MaterializedColumn> {
        export_columns(&self.columns)
    }

    /// Cursor over this page's rows with `active_id` as the active row.
    pub fn cursor(&self, active_id: Option<&str>) -> RowCursor {
        RowCursor::new(self.rows.iter().map(|r| r.id.clone()).collect(), active_id)
    }
}

/// Row restrictions sent with every fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    /// Free-text search on the record id.
    pub search: Option<String>,
    /// Checked against the view's filter columns before fetching.
    pub filters: Vec<Filter>,
}

impl RowQuery {
    pub fn new(search: Option<String>, filters: Vec<Filter>) -> Self {
        Self { search, filters }
    }
}

struct LoadedPage<R> {
    state: ViewState,
    page: RecordPage<R>,
    columns: Vec<MaterializedColumn>,
}

/// Defaults for the threads view: the standard column selection plus the
/// configured pagination and row height.
pub fn threads_view_defaults(config: &GridConfig) -> Result<ViewDefaults, GridError> {
    let mut state = ViewState::with_selected(DEFAULT_SELECTED_COLUMNS.iter().copied());
    state.set_page_size(config.default_page_size)?;
    state.set_row_height(config.default_row_height);

    let mut defaults = ViewDefaults::new();
    defaults.insert(ViewKey::new(THREADS_VIEW_KEY)?, state);
    Ok(defaults)
}

pub struct GridView {
    key: ViewKey,
    columns: DescriptorSet,
    filter_columns: DescriptorSet,
    dynamic: Option<DynamicColumnSpec>,
    pinned: Vec<String>,
    cache: DerivationCache,
}

impl GridView {
    pub fn new(key: ViewKey, columns: DescriptorSet) -> Self {
        Self {
            key,
            columns,
            filter_columns: DescriptorSet::default(),
            dynamic: None,
            pinned: Vec::new(),
            cache: DerivationCache::new(),
        }
    }

    /// The threads grid: thread columns, pinned id, one column per feedback
    /// score, and the thread filter catalog.
    pub fn threads() -> Result<Self, GridError> {
        Ok(Self::new(ViewKey::new(THREADS_VIEW_KEY)?, register(thread_columns())?)
            .with_dynamic(feedback_scores_spec())
            .with_pinned(PINNED_COLUMNS.iter().copied())
            .with_filter_columns(register(thread_filter_columns())?))
    }

    /// Columns filters may refer to. With none set, every filter is rejected.
    pub fn with_filter_columns(mut self, columns: DescriptorSet) -> Self {
        self.filter_columns = columns;
        self
    }

    pub fn with_dynamic(mut self, spec: DynamicColumnSpec) -> Self {
        self.dynamic = Some(spec);
        self.cache.clear();
        self
    }

    pub fn with_pinned<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.pinned = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn key(&self) -> &ViewKey {
        &self.key
    }

    pub fn static_columns(&self) -> &DescriptorSet {
        &self.columns
    }

    pub fn pinned(&self) -> &[String] {
        &self.pinned
    }

    pub fn filter_columns(&self) -> &DescriptorSet {
        &self.filter_columns
    }

    /// Static descriptors followed by the columns derived from `names`.
    pub fn descriptors(&mut self, names: &[String]) -> Result<DescriptorSet, GridError> {
        let Some(spec) = &self.dynamic else {
            return Ok(self.columns.clone());
        };
        let derived = self.cache.derive(spec, names).to_vec();
        Ok(self.columns.combine(derived)?)
    }

    /// Materializes the columns for `state`.
    pub fn columns(
        &mut self,
        state: &ViewState,
        names: &[String],
        sortable_by: &[String],
    ) -> Result<Vec<MaterializedColumn>, GridError> {
        let all = self.descriptors(names)?;
        Ok(materialize(&all, state, sortable_by, self.pinned.as_slice()))
    }

    /// Validates `query`, loads the view state, fetches names and the
    /// current page, and materializes the columns.
    fn load_page<S, P, N>(
        &mut self,
        store: &S,
        records: &P,
        names: &N,
        query: &RowQuery,
    ) -> Result<LoadedPage<P::Record>, GridError>
    where
        S: ViewStateStore + ?Sized,
        P: RecordProvider + ?Sized,
        N: NameProvider + ?Sized,
    {
        validate_all(&query.filters, &self.filter_columns)?;
        let state = store.load(&self.key);
        let names = names.names()?;

        let request = PageRequest {
            page: state.page_index(),
            size: state.page_size(),
            sorting: state.sort().to_vec(),
            search: query.search.clone(),
            filters: query.filters.clone(),
        };
        let page = records.fetch(&request)?;

        let all = self.descriptors(&names)?;
        let columns = materialize(
            &all,
            &state,
            page.sortable_by.as_slice(),
            self.pinned.as_slice(),
        );
        Ok(LoadedPage {
            state,
            page,
            columns,
        })
    }

    /// Loads the view state, fetches names and the current page, and renders it.
    pub fn refresh<S, P, N>(
        &mut self,
        store: &S,
        records: &P,
        names: &N,
        query: &RowQuery,
    ) -> Result<GridFrame, GridError>
    where
        S: ViewStateStore + ?Sized,
        P: RecordProvider + ?Sized,
        N: NameProvider + ?Sized,
    {
        let LoadedPage {
            state,
            page,
            columns,
        } = self.load_page(store, records, names, query)?;

        let rows = page
            .content
            .iter()
            .map(|record| GridRow {
                id: record.id().to_string(),
                cells: columns
                    .iter()
                    .map(|c| c.renderer.render(&record.value(&c.id)))
                    .collect(),
            })
            .collect::<Vec<_>>();

        debug!(
            view = %self.key,
            columns = columns.len(),
            rows = rows.len(),
            total = page.total,
            filters = query.filters.len(),
            "grid refreshed"
        );

        Ok(GridFrame {
            columns,
            rows,
            window: PageWindow::new(state.page_index(), state.page_size(), page.total),
            row_height: state.row_height(),
        })
    }

    /// Exports the rows of the current page whose id is in `row_ids`.
    pub fn export<S, P, N, I>(
        &mut self,
        store: &S,
        records: &P,
        names: &N,
        query: &RowQuery,
        row_ids: &[I],
    ) -> Result<ExportTable, GridError>
    where
        S: ViewStateStore + ?Sized,
        P: RecordProvider + ?Sized,
        N: NameProvider + ?Sized,
        I: AsRef<str>,
    {
        let loaded = self.load_page(store, records, names, query)?;
        let table = ExportTable::new(&loaded.columns, &loaded.page.content, row_ids);
        if table.rows.len() < row_ids.len() {
            warn!(
                requested = row_ids.len(),
                exported = table.rows.len(),
                "some rows are not on the current page"
            );
        }
        debug!(view = %self.key, rows = table.rows.len(), "rows exported");
        Ok(table)
    }

    /// Loads the state, applies `f`, and saves the result.
    ///
    /// The store does no locking: two sessions updating the same view
    /// concurrently end with whichever saved last.
    pub fn update<S, F>(&self, store: &mut S, f: F) -> Result<ViewState, GridError>
    where
        S: ViewStateStore + ?Sized,
        F: FnOnce(&mut ViewState) -> Result<(), ViewStateError>,
    {
        let mut state = store.load(&self.key);
        f(&mut state)?;
        store.save(&self.key, &state)?;
        Ok(state)
    }

    pub fn select_columns<S: ViewStateStore + ?Sized>(
        &self,
        store: &mut S,
        ids: Vec<String>,
    ) -> Result<ViewState, GridError> {
        self.update(store, |s| {
            s.set_selected_columns(ids);
            Ok(())
        })
    }

    pub fn set_column_order<S: ViewStateStore + ?Sized>(
        &self,
        store: &mut S,
        ids: Vec<String>,
    ) -> Result<ViewState, GridError> {
        self.update(store, |s| {
            s.set_column_order(ids);
            Ok(())
        })
    }

    pub fn set_column_widths<S: ViewStateStore + ?Sized>(
        &self,
        store: &mut S,
        widths: BTreeMap<String, u32>,
    ) -> Result<ViewState, GridError> {
        self.update(store, |s| {
            s.set_column_widths(widths);
            Ok(())
        })
    }

    /// Replaces the sort criteria and goes back to the first page.
    pub fn set_sort<S: ViewStateStore + ?Sized>(
        &self,
        store: &mut S,
        sort: Vec<SortSpec>,
    ) -> Result<ViewState, GridError> {
        self.update(store, |s| {
            s.set_sort(sort);
            s.set_page_index(1)
        })
    }

    pub fn set_page<S: ViewStateStore + ?Sized>(
        &self,
        store: &mut S,
        page: u32,
    ) -> Result<ViewState, GridError> {
        self.update(store, |s| s.set_page_index(page))
    }

    /// Replaces the page size and goes back to the first page.
    pub fn set_page_size<S: ViewStateStore + ?Sized>(
        &self,
        store: &mut S,
        size: u32,
    ) -> Result<ViewState, GridError> {
        self.update(store, |s| {
            s.set_page_size(size)?;
            s.set_page_index(1)
        })
    }

    pub fn set_row_height<S: ViewStateStore + ?Sized>(
        &self,
        store: &mut S,
        height: RowHeight,
    ) -> Result<ViewState, GridError> {
        self.update(store, |s| {
            s.set_row_height(height);
            Ok(())
        })
    }

    pub fn reset<S: ViewStateStore + ?Sized>(&self, store: &mut S) -> Result<ViewState, GridError> {
        Ok(store.reset(&self.key)?)
    }
}
