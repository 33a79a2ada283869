use super::post;
use crate::harness::{Assertion, Edit, ErrorMatch, Scenario};

#[test]
fn test_edit_checked_out_site() {
    let runner = Scenario::new("edit_checked_out_site")
        .from_fixture("default")
        .open("ny", "2024-01-01-New-Year.md", "h0")
        .update("ny", Edit::AddTag("archive".into()), "h0", "h1")
        .update("ny", Edit::AddTag("stale".into()), "h0", "h2")
        .fails_with(ErrorMatch::Conflict)
        .assert(Assertion::TagsEqual {
            alias: "ny".into(),
            tags: vec!["announcement".into(), "archive".into()],
        })
        .run()
        .expect("scenario should pass");

    let raw = runner
        .runner
        .workspace()
        .read_file("_posts/2024-01-01-New-Year.md")
        .unwrap();
    let raw = String::from_utf8(raw).unwrap();
    assert!(raw.contains("archive"));
    assert!(raw.ends_with("Happy new year from the club.\n"));
}

#[test]
fn test_create_and_delete_on_disk() {
    let runner = Scenario::new("create_and_delete_on_disk")
        .on_disk()
        .create_with("club", post("Club Meeting", "Alice", &["meetup"], "Hello"))
        .get("club", "h0")
        .assert_listing(&["2024-06-01-Club-Meeting.md"])
        .run()
        .unwrap();
    assert!(runner
        .runner
        .workspace()
        .file_exists("_posts/2024-06-01-Club-Meeting.md"));

    let runner = Scenario::new("delete_on_disk")
        .on_disk()
        .create("club", "Club Meeting", "Hello")
        .get("club", "h0")
        .delete("club", "h0")
        .assert_missing("club")
        .run()
        .unwrap();
    assert!(!runner
        .runner
        .workspace()
        .file_exists("_posts/2024-06-01-Club-Meeting.md"));
}

#[test]
fn test_rename_on_disk() {
    let runner = Scenario::new("rename_on_disk")
        .from_fixture("default")
        .open("spring", "2024-05-20-Spring-Meetup.md", "s0")
        .rename("spring", Edit::SetTitle("Spring Picnic".into()), "s0", "s1")
        .assert_path("spring", "2024-05-20-Spring-Picnic.md")
        .assert_listing_len(4)
        .run()
        .unwrap();

    let ws = runner.runner.workspace();
    assert!(ws.file_exists("_posts/2024-05-20-Spring-Picnic.md"));
    assert!(!ws.file_exists("_posts/2024-05-20-Spring-Meetup.md"));
}
