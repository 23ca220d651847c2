use super::*;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    key: &'static str,
    number: i64,
    name: &'static str,
    born: Option<NaiveDate>,
}

fn row(key: &'static str, number: i64, name: &'static str) -> Row {
    Row {
        key,
        number,
        name,
        born: None,
    }
}

fn columns() -> Vec<ColumnDescriptor<Row>> {
    vec![
        ColumnDescriptor::new("number", "Number", |row: &Row| CellValue::Integer(row.number)),
        ColumnDescriptor::new("name", "Name", |row: &Row| CellValue::text(row.name)),
        ColumnDescriptor::new("born", "Born", |row: &Row| {
            row.born.map(CellValue::Date).unwrap_or(CellValue::Empty)
        })
        .unfilterable(),
        ColumnDescriptor::new("actions", "", |_: &Row| CellValue::Empty)
            .unsortable()
            .always_visible()
            .with_renderer(|row: &Row| format!("edit {} | delete {}", row.key, row.key)),
    ]
}

fn table() -> Table<Row> {
    Table::new(columns(), |row: &Row| row.key.to_string())
}

fn records() -> Vec<Row> {
    vec![
        row("a", 3, "Carol"),
        row("b", 1, "alice"),
        row("c", 2, "Bob"),
        row("d", 1, "Dave"),
    ]
}

fn keys(rows: &[&Row]) -> Vec<&'static str> {
    rows.iter().map(|row| row.key).collect()
}

#[test]
fn unsorted_table_keeps_input_order() {
    let records = records();
    assert_eq!(keys(&table().visible_rows(&records)), vec!["a", "b", "c", "d"]);
}

#[test]
fn visible_rows_is_repeatable_for_the_same_state() {
    let records = records();
    let mut table = table();
    table.toggle_sort("name");
    table.set_filter("name", ColumnFilter::Contains("a".into()));

    assert_eq!(table.visible_rows(&records), table.visible_rows(&records));
}

#[test]
fn toggle_sort_cycles_ascending_descending_unsorted() {
    let records = records();
    let mut table = table();

    assert!(table.toggle_sort("name"));
    assert_eq!(
        table.sort(),
        Some(&SortState {
            column: "name",
            direction: SortDirection::Ascending
        })
    );
    assert_eq!(keys(&table.visible_rows(&records)), vec!["b", "c", "a", "d"]);

    table.toggle_sort("name");
    assert_eq!(keys(&table.visible_rows(&records)), vec!["d", "a", "c", "b"]);

    table.toggle_sort("name");
    assert_eq!(table.sort(), None);
    assert_eq!(keys(&table.visible_rows(&records)), vec!["a", "b", "c", "d"]);
}

#[test]
fn sorting_another_column_replaces_active_sort() {
    let mut table = table();
    table.toggle_sort("name");
    table.toggle_sort("name");
    table.toggle_sort("number");

    assert_eq!(
        table.sort(),
        Some(&SortState {
            column: "number",
            direction: SortDirection::Ascending
        })
    );
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let records = records();
    let mut table = table();
    table.toggle_sort("number");
    assert_eq!(keys(&table.visible_rows(&records)), vec!["b", "d", "c", "a"]);

    table.toggle_sort("number");
    // Descending keeps b before d as they compare equal.
    assert_eq!(keys(&table.visible_rows(&records)), vec!["a", "c", "b", "d"]);
}

#[test]
fn sorting_sorted_rows_again_changes_nothing() {
    let records = records();
    let mut table = table();
    table.toggle_sort("number");
    let once: Vec<Row> = table
        .visible_rows(&records)
        .into_iter()
        .cloned()
        .collect();
    let twice: Vec<Row> = table.visible_rows(&once).into_iter().cloned().collect();

    assert_eq!(once, twice);
}

#[test]
fn unsortable_and_unknown_columns_are_ignored() {
    let mut table = table();
    assert!(!table.toggle_sort("actions"));
    assert!(!table.toggle_sort("missing"));
    assert_eq!(table.sort(), None);
}

#[test]
fn empty_cells_sort_first() {
    let mut records = records();
    records[2].born = NaiveDate::from_ymd_opt(2001, 5, 6);
    records[0].born = NaiveDate::from_ymd_opt(1999, 1, 2);
    let mut table = table();
    table.toggle_sort("born");

    assert_eq!(keys(&table.visible_rows(&records)), vec!["b", "d", "a", "c"]);
}

#[test]
fn filters_are_combined_with_and() {
    let records = records();
    let mut table = table();
    table.set_filter("name", ColumnFilter::Contains("A".into()));
    assert_eq!(keys(&table.visible_rows(&records)), vec!["a", "b", "d"]);

    table.set_filter("number", ColumnFilter::Equals(CellValue::Integer(1)));
    assert_eq!(keys(&table.visible_rows(&records)), vec!["b", "d"]);

    table.set_filter(
        "number",
        ColumnFilter::predicate(|value| matches!(value, CellValue::Integer(n) if *n > 1)),
    );
    assert_eq!(keys(&table.visible_rows(&records)), vec!["a"]);

    assert!(table.clear_filter("name"));
    assert_eq!(keys(&table.visible_rows(&records)), vec!["a", "c"]);
}

#[test]
fn a_row_is_visible_iff_it_satisfies_every_filter() {
    let records = records();
    let mut table = table().with_page_size(100);
    table.set_filter("name", ColumnFilter::Contains("o".into()));
    table.set_filter(
        "number",
        ColumnFilter::predicate(|value| matches!(value, CellValue::Integer(n) if *n >= 2)),
    );

    let visible = keys(&table.visible_rows(&records));
    for row in &records {
        let expected = row.name.to_lowercase().contains('o') && row.number >= 2;
        assert_eq!(visible.contains(&row.key), expected, "row {}", row.key);
    }
}

#[test]
fn filters_on_unfilterable_columns_are_rejected() {
    let mut table = table();
    assert!(!table.set_filter("born", ColumnFilter::Contains("1999".into())));
    assert!(!table.set_filter("missing", ColumnFilter::Contains("x".into())));
    assert_eq!(table.filters().count(), 0);
}

#[test]
fn everything_filtered_out_yields_no_rows() {
    let records = records();
    let mut table = table();
    table.set_filter("name", ColumnFilter::Contains("zzz".into()));

    assert!(table.visible_rows(&records).is_empty());
    assert_eq!(table.page_count(&records), 1);
    assert!(!table.can_next_page(&records));
    assert!(table.visible_rows(&[]).is_empty());
}

#[test]
fn pagination_slices_and_never_wraps() {
    let records: Vec<Row> = (0..25)
        .map(|n| Row {
            key: Box::leak(format!("k{n:02}").into_boxed_str()),
            number: n,
            name: "x",
            born: None,
        })
        .collect();
    let mut table = table();

    assert_eq!(table.page_count(&records), 3);
    assert!(!table.previous_page());
    assert_eq!(table.page_index(), 0);

    assert!(table.next_page(&records));
    assert!(table.next_page(&records));
    assert_eq!(table.visible_rows(&records).len(), 5);
    assert_eq!(table.visible_rows(&records)[0].number, 20);

    assert!(!table.next_page(&records));
    assert_eq!(table.page_index(), 2);

    assert!(table.previous_page());
    assert_eq!(table.page_index(), 1);
}

#[test]
fn changing_filters_returns_to_first_page() {
    let records = records();
    let mut table = table().with_page_size(2);
    assert!(table.next_page(&records));
    table.set_filter("name", ColumnFilter::Contains("a".into()));
    assert_eq!(table.page_index(), 0);
}

#[test]
fn set_page_index_clamps_to_last_page() {
    let records = records();
    let mut table = table().with_page_size(3);
    table.set_page_index(9, &records);
    assert_eq!(table.page_index(), 1);
}

#[test]
fn hiding_columns_respects_hideable_flag() {
    let records = records();
    let mut table = table();
    assert!(table.set_column_visibility("born", false));
    assert!(!table.set_column_visibility("actions", false));

    let ids: Vec<&str> = table.visible_columns().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["number", "name", "actions"]);
    assert_eq!(
        table.render_row(&records[0]),
        vec!["3".to_string(), "Carol".to_string(), "edit a | delete a".to_string()]
    );
}

#[test]
fn selection_summary_counts_selected_filtered_rows() {
    let records = records();
    let mut table = table();
    assert!(table.toggle_row_selected("a"));
    assert!(table.toggle_row_selected("c"));
    assert_eq!(table.selection_summary(&records).to_string(), "2 of 4 row(s) selected.");

    table.set_filter("name", ColumnFilter::Contains("carol".into()));
    assert_eq!(table.selection_summary(&records).to_string(), "1 of 1 row(s) selected.");

    assert!(!table.toggle_row_selected("a"));
    assert!(!table.is_selected("a"));
}

#[test]
fn sync_drops_stale_selection_and_clamps_page() {
    let records = records();
    let mut table = table().with_page_size(2);
    table.toggle_row_selected("a");
    table.toggle_row_selected("d");
    table.next_page(&records);

    let remaining = vec![records[0].clone(), records[1].clone()];
    table.sync(&remaining);

    assert_eq!(table.selected_keys().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(table.page_index(), 0);
}

#[test]
fn view_reports_headers_rows_and_paging() {
    let mut records = records();
    records[0].born = NaiveDate::from_ymd_opt(2024, 3, 4);
    let mut table = table().with_page_size(3);
    table.toggle_sort("number");
    table.toggle_row_selected("b");

    let view = table.view(&records);
    assert_eq!(view.headers[0].sorted, Some(SortDirection::Ascending));
    assert_eq!(view.headers[1].sorted, None);
    assert_eq!(view.rows.len(), 3);
    assert!(view.rows[0].selected);
    assert_eq!(view.rows[0].key, "b");
    assert_eq!(view.page_count, 2);
    assert!(view.can_next);
    assert!(!view.can_previous);

    table.next_page(&records);
    let view = table.view(&records);
    assert_eq!(view.rows[0].cells[2], "March 4, 2024");
}

#[test]
fn long_date_format_has_no_padding() {
    let date = NaiveDate::from_ymd_opt(2023, 1, 9).expect("date");
    assert_eq!(format_long_date(date), "January 9, 2023");
}
