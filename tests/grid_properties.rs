use dyntable::grid::{Column, Direction, FilterValue, Grid, GridConfig, Row, RowId, RowInput, Value};
use proptest::prelude::*;

const STATUSES: [&str; 3] = ["Single", "Married", "Complicated"];

fn people_grid() -> Grid {
    let mut grid = Grid::new(GridConfig::default());
    grid.add_column(Column::text("name", "Name")).unwrap();
    grid.add_column(Column::number("age", "Age")).unwrap();
    grid.add_column(Column::text("status", "Status")).unwrap();
    grid
}

fn person() -> impl Strategy<Value = (String, u8, &'static str)> {
    ("[a-c]{1,2}", 0u8..100, prop::sample::select(&STATUSES[..]))
}

fn fill(people: &[(String, u8, &'static str)]) -> Grid {
    let mut grid = people_grid();
    for (name, age, status) in people {
        let input = RowInput::new()
            .with("name", name.as_str())
            .with("age", age.to_string())
            .with("status", *status);
        grid.add_row(&input).unwrap();
    }
    grid
}

fn field(grid: &Grid, row: &Row, id: &str) -> Value {
    row.get(grid.column(id).unwrap()).into_owned()
}

/// Visible rows as (id, age) pairs.
fn ages(grid: &Grid) -> Vec<(RowId, f64)> {
    grid.visible_rows()
        .iter()
        .map(|r| (r.id(), field(grid, r, "age").as_number().unwrap()))
        .collect()
}

proptest! {
    #[test]
    fn prop_rows_keep_insertion_order(people in prop::collection::vec(person(), 0..20)) {
        let grid = fill(&people);
        prop_assert_eq!(grid.len(), people.len());
        let names: Vec<String> = grid.visible_rows().iter().map(|r| field(&grid, r, "name").to_string()).collect();
        let expected: Vec<String> = people.iter().map(|(n, _, _)| n.clone()).collect();
        prop_assert_eq!(names, expected);
    }

    #[test]
    fn prop_new_column_defaults_existing_rows(people in prop::collection::vec(person(), 0..10), numeric in any::<bool>()) {
        let mut grid = fill(&people);
        let before = grid.columns().len();
        let column = if numeric { Column::number("score", "Score") } else { Column::text("score", "Score") };
        grid.add_column(column.clone()).unwrap();

        prop_assert_eq!(grid.columns().len(), before + 1);
        prop_assert_eq!(grid.columns().last(), Some(&column));
        for row in grid.rows() {
            prop_assert_eq!(row.get(&column).into_owned(), column.column_type.default_value());
        }
    }

    #[test]
    fn prop_duplicate_column_is_rejected(people in prop::collection::vec(person(), 0..5), idx in 0usize..3) {
        let mut grid = fill(&people);
        let columns = grid.columns().to_vec();
        let duplicate = Column::text(columns[idx].id.clone(), "Again");
        prop_assert!(grid.add_column(duplicate).is_err());
        prop_assert_eq!(grid.columns(), &columns[..]);
    }

    #[test]
    fn prop_delete_removes_every_match(people in prop::collection::vec(person(), 0..20), target in "[a-c]{1,2}") {
        let mut grid = fill(&people);
        let expected = people.iter().filter(|(n, _, _)| *n == target).count();
        prop_assert_eq!(grid.delete_row(&Value::text(target.clone())), expected);
        prop_assert_eq!(grid.len(), people.len() - expected);
        prop_assert!(grid.rows().iter().all(|r| field(&grid, r, "name") != Value::text(target.clone())));
    }

    #[test]
    fn prop_filter_is_an_ordered_subset(
        people in prop::collection::vec(person(), 0..20),
        status in prop::sample::select(&STATUSES[..]),
    ) {
        let mut grid = fill(&people);
        grid.set_filter("status", Value::text(status));
        let visible: Vec<_> = grid.visible_rows().iter().map(|r| r.id()).collect();
        let expected: Vec<_> = grid
            .rows()
            .iter()
            .filter(|r| field(&grid, r, "status") == Value::text(status))
            .map(|r| r.id())
            .collect();
        prop_assert_eq!(visible, expected);

        grid.set_filter("status", FilterValue::All);
        prop_assert_eq!(grid.visible_rows().len(), people.len());
    }

    #[test]
    fn prop_sort_toggles_are_ordered_and_stable(people in prop::collection::vec(person(), 0..20)) {
        let mut grid = fill(&people);

        prop_assert_eq!(grid.toggle_sort("age").unwrap(), Direction::Ascending);
        let ascending = ages(&grid);
        for pair in ascending.windows(2) {
            prop_assert!(pair[0].1 < pair[1].1 || (pair[0].1 == pair[1].1 && pair[0].0 < pair[1].0));
        }

        prop_assert_eq!(grid.toggle_sort("age").unwrap(), Direction::Descending);
        for pair in ages(&grid).windows(2) {
            prop_assert!(pair[0].1 > pair[1].1 || (pair[0].1 == pair[1].1 && pair[0].0 < pair[1].0));
        }

        prop_assert_eq!(grid.toggle_sort("age").unwrap(), Direction::Ascending);
        prop_assert_eq!(ages(&grid), ascending);
    }
}
