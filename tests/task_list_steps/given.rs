//! Given steps for task list BDD scenarios.

use super::world::{TaskListWorld, run_async, task_id};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskdeck::task::adapters::memory::{BlobOperation, StoredObject, StoreOperation};
use taskdeck::task::domain::{AttachmentKey, TaskRecord};

#[given(r#"the store holds a plain task "{id}" with content "{content}""#)]
fn plain_task(
    world: &mut TaskListWorld,
    id: String,
    content: String,
) -> Result<(), eyre::Report> {
    world
        .store
        .seed([TaskRecord::new(task_id(&id)?, content)])
        .wrap_err("seed plain task")
}

#[given(r#"the store holds task "{id}" with attachment "{key}""#)]
fn attached_task(
    world: &mut TaskListWorld,
    id: String,
    key: String,
) -> Result<(), eyre::Report> {
    let attachment = AttachmentKey::new(key).wrap_err("parse attachment key")?;
    world
        .blobs
        .seed(
            attachment.clone(),
            StoredObject {
                content_type: "image/png".to_owned(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            },
        )
        .wrap_err("seed attachment object")?;
    world
        .store
        .seed([TaskRecord::new(task_id(&id)?, "With attachment").with_attachment(attachment)])
        .wrap_err("seed attached task")
}

#[given("the task list has been fetched")]
fn list_fetched(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    let outcome = run_async(world.controller.fetch());
    eyre::ensure!(outcome.is_completed(), "initial fetch failed: {outcome:?}");
    world.journal.clear();
    Ok(())
}

#[given("the store rejects task creation")]
fn store_rejects_creation(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    world
        .store
        .fail_on(StoreOperation::Create)
        .wrap_err("inject create failure")
}

#[given("the blob store rejects removals")]
fn blob_store_rejects_removals(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    world
        .blobs
        .fail_on(BlobOperation::Remove)
        .wrap_err("inject remove failure")
}
