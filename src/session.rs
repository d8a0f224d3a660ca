// Explicit session context threaded through each interaction.
//
// A session pairs the loaded table with the filters currently selected.
// Changing a filter produces a new `Session`; the table itself is shared and
// never touched after loading.
use crate::filter::{apply, FilterOptions, FilterSpec, View};
use crate::reports::{Dashboard, Measure};
use crate::types::{SalesTable, Targets};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct Session {
    table: Rc<SalesTable>,
    filters: FilterSpec,
    targets: Targets,
}

impl Session {
    pub fn new(table: SalesTable, targets: Targets) -> Self {
        Session {
            table: Rc::new(table),
            filters: FilterSpec::default(),
            targets,
        }
    }

    pub fn with_filters(&self, filters: FilterSpec) -> Self {
        Session {
            table: Rc::clone(&self.table),
            filters,
            targets: self.targets,
        }
    }

    pub fn table(&self) -> &SalesTable {
        &self.table
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn options(&self) -> FilterOptions {
        FilterOptions::from_table(&self.table)
    }

    pub fn view(&self) -> View<'_> {
        apply(&self.table, &self.filters)
    }

    pub fn dashboard(&self, month_measure: Measure, sample_size: usize) -> Dashboard {
        Dashboard::build(&self.view(), &self.targets, month_measure, sample_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Selection;
    use crate::fixtures::{sample_table, value_of};

    #[test]
    fn refiltering_leaves_the_original_session_alone() {
        let base = Session::new(sample_table(), Targets::default());
        let narrowed = base.with_filters(FilterSpec {
            branch: Selection::Only("B".into()),
            ..FilterSpec::default()
        });

        assert_eq!(base.view().len(), 8);
        assert_eq!(narrowed.view().len(), 2);
        assert!(base.filters().is_unfiltered());
        assert!(std::ptr::eq(base.table(), narrowed.table()));
    }

    #[test]
    fn dashboard_reflects_current_filters() {
        let session = Session::new(sample_table(), Targets::default()).with_filters(FilterSpec {
            city: Selection::Only("Mandalay".into()),
            ..FilterSpec::default()
        });
        let d = session.dashboard(Measure::Total, 5);
        assert_eq!(d.metrics.row_count, 2);
        assert_eq!(d.sales_by_city.rows.len(), 1);
        assert_eq!(value_of(&d.sales_by_city, "Mandalay"), Some(168.0));
        // Options always describe the full table, not the filtered view.
        assert_eq!(session.options().cities.len(), 3);
    }
}
