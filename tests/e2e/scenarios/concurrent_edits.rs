use crate::harness::{Assertion, Edit, ErrorMatch, Scenario};

#[test]
fn test_second_writer_with_same_version_conflicts() {
    // Two editors both read h0; only the first write lands
    Scenario::new("second_writer_conflicts")
        .create("club", "Club Meeting", "Hello")
        .get("club", "h0")
        .update("club", Edit::SetBody("mine".into()), "h0", "h1")
        .update("club", Edit::SetBody("theirs".into()), "h0", "h2")
        .fails_with(ErrorMatch::Conflict)
        .assert_body("club", "mine")
        .assert(Assertion::CurrentHashIs {
            alias: "club".into(),
            hash: "h1".into(),
        })
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_hand_edit_is_never_overwritten() {
    Scenario::new("hand_edit_not_overwritten")
        .create("club", "Club Meeting", "Hello")
        .get("club", "h0")
        .external_edit("club", "---\ntitle: Club Meeting\n---\nHand edited")
        .update("club", Edit::SetBody("from the editor".into()), "h0", "h1")
        .fails_with(ErrorMatch::Conflict)
        .assert_body("club", "Hand edited")
        .get("club", "h1")
        .update("club", Edit::SetBody("merged".into()), "h1", "h2")
        .assert_body("club", "merged")
        .run()
        .unwrap();
}

#[test]
fn test_stale_delete_rejected() {
    Scenario::new("stale_delete_rejected")
        .create("club", "Club Meeting", "Hello")
        .get("club", "h0")
        .update("club", Edit::AddTag("social".into()), "h0", "h1")
        .delete("club", "h0")
        .fails_with(ErrorMatch::Conflict)
        .assert_exists("club")
        .delete("club", "h1")
        .assert_missing("club")
        .run()
        .unwrap();
}

#[test]
fn test_operations_on_deleted_document() {
    Scenario::new("operations_on_deleted_document")
        .create("club", "Club Meeting", "Hello")
        .get("club", "h0")
        .delete("club", "h0")
        .delete("club", "h0")
        .fails_with(ErrorMatch::NotFound)
        .update("club", Edit::SetBody("revived".into()), "h0", "h1")
        .fails_with(ErrorMatch::NotFound)
        .assert_listing_len(0)
        .run()
        .unwrap();
}

#[test]
fn test_same_title_same_day_never_overwrites() {
    Scenario::new("same_title_same_day")
        .create("a", "Club Meeting", "first")
        .create("b", "Club Meeting", "second")
        .fails_with(ErrorMatch::AlreadyExists)
        .assert_body("a", "first")
        .advance_days(1)
        .create("b", "Club Meeting", "second")
        .assert_path("b", "2024-06-02-Club-Meeting.md")
        .assert_listing_len(2)
        .run()
        .unwrap();
}

#[test]
fn test_transient_failures_are_retried() {
    Scenario::new("transient_failures_retried")
        .create("club", "Club Meeting", "Hello")
        .fail_next_store_calls(2)
        .assert_listing_len(1)
        .fail_next_store_calls(2)
        .get("club", "h0")
        .run()
        .unwrap();
}

#[test]
fn test_exhausted_retries_surface_transient() {
    Scenario::new("exhausted_retries")
        .fail_next_store_calls(3)
        .create("club", "Club Meeting", "Hello")
        .fails_with(ErrorMatch::Transient)
        .create("club", "Club Meeting", "Hello")
        .assert_listing_len(1)
        .run()
        .unwrap();
}

#[test]
fn test_invalid_input_never_reaches_store() {
    Scenario::new("invalid_input")
        .create("blank", "   ", "body")
        .fails_with(ErrorMatch::InvalidInput)
        .create("empty", "Title", "")
        .fails_with(ErrorMatch::InvalidInput)
        .get_path("../secrets.md")
        .fails_with(ErrorMatch::InvalidInput)
        .assert_store_calls(0)
        .get_path("2024-06-01-Nothing.md")
        .fails_with(ErrorMatch::NotFound)
        .run()
        .unwrap();
}
