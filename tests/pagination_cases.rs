use pretty_assertions::assert_eq;

use bizdoc_worker::pagination::{
    DEFAULT_ROW_HEIGHT, FallbackHeights, Measurements, PageGeometry, paginate, paginate_with,
};

// printable = 1123 - 48 - 48 = 1027
// page 1 budget = 1027 - 300 - 50 - 40 = 637
// later budget = 1027 - 60 - 50 - 40 = 877
fn measured(rows: Vec<f64>, footer: f64) -> Measurements {
    Measurements {
        header: Some(300.0),
        header_spacer: Some(60.0),
        table_header: Some(50.0),
        footer: Some(footer),
        rows,
    }
}

#[test]
fn pages_cover_every_item_once_in_order() {
    let rows = (0..40)
        .map(|index| 40.0 + f64::from(index % 7) * 25.0)
        .collect::<Vec<_>>();
    let pagination = paginate(rows.len(), &measured(rows.clone(), 260.0));

    assert_eq!(pagination.item_count(), rows.len());
    let mut expected_start = 0;
    for page in &pagination.pages {
        assert_eq!(page.items.start, expected_start);
        expected_start = page.items.end;
    }
    assert_eq!(expected_start, rows.len());

    assert!(pagination.pages[0].is_first_page);
    assert!(pagination.pages.last().is_some_and(|page| page.is_last_page));
    assert_eq!(
        pagination.pages.iter().filter(|page| page.is_first_page).count(),
        1
    );
    assert_eq!(
        pagination.pages.iter().filter(|page| page.is_last_page).count(),
        1
    );
}

#[test]
fn exactly_filled_first_page_keeps_all_items() {
    // 7 x 91 = 637, the page 1 budget to the pixel.
    let pagination = paginate(7, &measured(vec![91.0; 7], 200.0));
    let ranges = pagination
        .pages
        .iter()
        .map(|page| page.items.clone())
        .collect::<Vec<_>>();

    // The rows never spill; only the footer moves to its own page.
    assert_eq!(ranges, vec![0..7, 7..7]);
    assert!(pagination.footer_on_own_page);
}

#[test]
fn items_leaving_room_for_footer_stay_on_one_page() {
    // remaining = 637 - 300 = 337 > 200 + 40
    let pagination = paginate(3, &measured(vec![100.0; 3], 200.0));
    assert_eq!(pagination.page_count(), 1);
    assert_eq!(pagination.pages[0].items, 0..3);
    assert!(!pagination.footer_on_own_page);
}

#[test]
fn footer_overflow_appends_item_free_page() {
    // remaining = 637 - 400 = 237, footer + margin = 240
    let pagination = paginate(4, &measured(vec![100.0; 4], 200.0));
    assert_eq!(pagination.page_count(), 2);
    assert_eq!(pagination.pages[0].items, 0..4);
    assert!(pagination.pages[1].is_empty());
    assert!(pagination.pages[1].is_last_page);
    assert!(!pagination.pages[0].is_last_page);
    assert!(pagination.footer_on_own_page);
}

#[test]
fn footer_tie_goes_to_extra_page() {
    // remaining = 637 - 397 = 240, exactly footer + margin
    let pagination = paginate(1, &measured(vec![397.0], 200.0));
    assert!(pagination.footer_on_own_page);
    assert_eq!(pagination.page_count(), 2);
}

#[test]
fn later_pages_use_the_spacer_budget() {
    let pagination = paginate(20, &measured(vec![100.0; 20], 100.0));
    let sizes = pagination
        .pages
        .iter()
        .map(bizdoc_worker::pagination::Page::len)
        .collect::<Vec<_>>();
    // 6 rows on page 1 (600 <= 637), 8 per later page (800 <= 877).
    assert_eq!(sizes, vec![6, 8, 6]);
}

#[test]
fn zero_items_yield_one_empty_page() {
    let pagination = paginate(0, &Measurements::default());
    assert_eq!(pagination.page_count(), 1);
    let page = &pagination.pages[0];
    assert!(page.is_empty());
    assert!(page.is_first_page);
    assert!(page.is_last_page);
    assert!(!pagination.footer_on_own_page);
}

#[test]
fn missing_row_measurements_use_default_height() {
    let with_defaults = paginate(12, &Measurements::default());
    let explicit = paginate(
        12,
        &Measurements {
            rows: vec![DEFAULT_ROW_HEIGHT; 12],
            ..Measurements::default()
        },
    );
    assert_eq!(with_defaults, explicit);

    // Surplus measurements are ignored.
    let surplus = paginate(
        2,
        &Measurements {
            rows: vec![10.0; 50],
            ..Measurements::default()
        },
    );
    assert_eq!(surplus.item_count(), 2);
}

#[test]
fn custom_geometry_changes_budgets() {
    let geometry = PageGeometry {
        page_height: 500.0,
        padding_top: 0.0,
        padding_bottom: 0.0,
        safety_margin: 0.0,
        margin: 0.0,
    };
    let measurements = Measurements {
        header: Some(100.0),
        header_spacer: Some(0.0),
        table_header: Some(0.0),
        footer: Some(0.0),
        rows: vec![100.0; 9],
    };
    let pagination = paginate_with(9, &measurements, &geometry, &FallbackHeights::default());
    let sizes = pagination
        .pages
        .iter()
        .map(bizdoc_worker::pagination::Page::len)
        .collect::<Vec<_>>();
    // 4 fit under the header, then 5 per page with no room left for a footer.
    assert_eq!(sizes, vec![4, 5, 0]);
}

#[test]
fn preview_payload_uses_camel_case() {
    let pagination = paginate(1, &measured(vec![50.0], 100.0));
    let value = serde_json::to_value(&pagination).expect("serializable");
    assert_eq!(value["footerOnOwnPage"], false);
    assert_eq!(value["pages"][0]["isFirstPage"], true);
    assert_eq!(value["pages"][0]["items"]["start"], 0);
    assert_eq!(value["pages"][0]["items"]["end"], 1);
}
