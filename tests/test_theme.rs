use ped_detect::theme::Theme;
use ped_detect::web::render_index;

#[test]
fn switches_at_six_and_eighteen() {
    assert_eq!(Theme::for_hour(0), Theme::Night);
    assert_eq!(Theme::for_hour(5), Theme::Night);
    assert_eq!(Theme::for_hour(6), Theme::Day);
    assert_eq!(Theme::for_hour(12), Theme::Day);
    assert_eq!(Theme::for_hour(17), Theme::Day);
    assert_eq!(Theme::for_hour(18), Theme::Night);
    assert_eq!(Theme::for_hour(23), Theme::Night);
}

#[test]
fn page_carries_the_theme() {
    let day = render_index(Theme::Day);
    assert!(day.contains("data-theme=\"day\""));
    assert!(day.contains("#006400"));
    assert!(!day.contains("#40e0d0"));

    let night = render_index(Theme::Night);
    assert!(night.contains("data-theme=\"night\""));
    assert!(night.contains("#1e1e1e"));
    assert!(!night.contains("__STYLE__"));
}
