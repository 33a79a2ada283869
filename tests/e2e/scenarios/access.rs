use crate::harness::{ErrorMatch, Scenario, EDITOR};

const MALLORY: &str = "mallory@example.com";

#[test]
fn test_unlisted_identity_cannot_mutate() {
    Scenario::new("unlisted_identity")
        .act_as(MALLORY)
        .create("club", "Club Meeting", "Hello")
        .fails_with(ErrorMatch::AccessDenied)
        .upload("a.png", b"png")
        .fails_with(ErrorMatch::AccessDenied)
        .assert_store_calls(0)
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_reads_open_to_everyone() {
    Scenario::new("reads_open")
        .with_blob("_posts/2024-06-01-Hello.md", "---\ntitle: Hello\n---\nhi")
        .act_as(MALLORY)
        .assert_listing(&["2024-06-01-Hello.md"])
        .get_path("2024-06-01-Hello.md")
        .run()
        .unwrap();
}

#[test]
fn test_switching_identity() {
    Scenario::new("switching_identity")
        .create("club", "Club Meeting", "Hello")
        .get("club", "h0")
        .act_as(MALLORY)
        .delete("club", "h0")
        .fails_with(ErrorMatch::AccessDenied)
        .assert_exists("club")
        .act_as(EDITOR)
        .delete("club", "h0")
        .assert_missing("club")
        .run()
        .unwrap();
}

#[test]
fn test_empty_allow_list_denies_everyone() {
    Scenario::new("empty_allow_list")
        .allowing(&[])
        .create("club", "Club Meeting", "Hello")
        .fails_with(ErrorMatch::AccessDenied)
        .act_as("")
        .create("club", "Club Meeting", "Hello")
        .fails_with(ErrorMatch::AccessDenied)
        .run()
        .unwrap();
}
