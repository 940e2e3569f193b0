//! Then steps for task list BDD scenarios.

use super::world::{BLOB_BASE_URL, TaskListWorld, task_id};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use taskdeck::task::{
    adapters::memory::RecordedCall,
    domain::{AttachmentKey, Task, UploadProgress},
};

fn listed_task(world: &TaskListWorld, id: &str) -> Result<Task, eyre::Report> {
    let target = task_id(id)?;
    world
        .controller
        .task(&target)
        .ok_or_else(|| eyre::eyre!("task {id} is not listed"))
}

#[then("the task count is {count:u64}")]
fn task_count(world: &mut TaskListWorld, count: u64) -> Result<(), eyre::Report> {
    let listed = u64::try_from(world.controller.tasks().len()).wrap_err("count tasks")?;
    eyre::ensure!(listed == count, "expected {count} tasks, found {listed}");
    Ok(())
}

#[then(r#"task "{id}" has no attachment URL"#)]
fn no_attachment_url(world: &mut TaskListWorld, id: String) -> Result<(), eyre::Report> {
    let task = listed_task(world, &id)?;
    eyre::ensure!(
        task.attachment_url().is_none(),
        "task {id} unexpectedly has an attachment URL"
    );
    Ok(())
}

#[then(r#"task "{id}" has an attachment URL for "{key}""#)]
fn attachment_url_for(
    world: &mut TaskListWorld,
    id: String,
    key: String,
) -> Result<(), eyre::Report> {
    let task = listed_task(world, &id)?;
    let url = task
        .attachment_url()
        .ok_or_else(|| eyre::eyre!("task {id} has no attachment URL"))?;
    let expected_prefix = format!("{BLOB_BASE_URL}/{key}?expires=");
    eyre::ensure!(
        url.starts_with(&expected_prefix),
        "URL {url} does not point at {key}"
    );
    Ok(())
}

#[then("no request was sent")]
fn no_request_sent(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    let calls = world.journal.calls();
    eyre::ensure!(calls.is_empty(), "unexpected requests: {calls:?}");
    Ok(())
}

#[then("no error is shown")]
fn no_error_shown(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    let error = world.controller.error();
    eyre::ensure!(error.is_none(), "unexpected error: {error:?}");
    Ok(())
}

#[then("an error is shown")]
fn error_shown(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        world.controller.error().is_some(),
        "expected an error after {:?}",
        world.last_outcome
    );
    Ok(())
}

#[then(r#"attachment "{key}" was removed before task "{id}" was deleted"#)]
fn attachment_removed_first(
    world: &mut TaskListWorld,
    key: String,
    id: String,
) -> Result<(), eyre::Report> {
    let calls = world.journal.calls();
    let removed = RecordedCall::RemoveBlob(AttachmentKey::new(key).wrap_err("parse key")?);
    let deleted = RecordedCall::DeleteTask(task_id(&id)?);
    let removed_at = calls
        .iter()
        .position(|call| *call == removed)
        .ok_or_else(|| eyre::eyre!("attachment was never removed: {calls:?}"))?;
    let deleted_at = calls
        .iter()
        .position(|call| *call == deleted)
        .ok_or_else(|| eyre::eyre!("task was never deleted: {calls:?}"))?;
    eyre::ensure!(removed_at < deleted_at, "task deleted before its attachment");
    Ok(())
}

#[then(r#"task "{id}" is still stored"#)]
fn task_still_stored(world: &mut TaskListWorld, id: String) -> Result<(), eyre::Report> {
    let target = task_id(&id)?;
    let records = world.store.records().wrap_err("read stored tasks")?;
    eyre::ensure!(
        records.iter().any(|record| record.task_id == target),
        "task {id} was deleted"
    );
    eyre::ensure!(
        !world.journal.calls().contains(&RecordedCall::DeleteTask(target)),
        "delete request was sent"
    );
    Ok(())
}

#[then("upload progress rose from 0 to 100")]
fn progress_rose(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    let values = world.progress.lock().clone();
    eyre::ensure!(
        values.first() == Some(&UploadProgress::ZERO),
        "progress did not start at 0: {values:?}"
    );
    eyre::ensure!(
        values.last() == Some(&UploadProgress::COMPLETE),
        "progress did not end at 100: {values:?}"
    );
    eyre::ensure!(
        values.windows(2).all(|pair| pair.first() <= pair.last()),
        "progress went backwards: {values:?}"
    );
    Ok(())
}

#[then(r#"task "{id}" references an attachment ending in "{suffix}""#)]
fn references_attachment(
    world: &mut TaskListWorld,
    id: String,
    suffix: String,
) -> Result<(), eyre::Report> {
    let target = task_id(&id)?;
    let record = world
        .store
        .records()
        .wrap_err("read stored tasks")?
        .into_iter()
        .find(|record| record.task_id == target)
        .ok_or_else(|| eyre::eyre!("task {id} is not stored"))?;
    let key = record
        .attachment
        .ok_or_else(|| eyre::eyre!("task {id} has no attachment"))?;
    eyre::ensure!(key.as_str().ends_with(&suffix), "unexpected key {key}");
    eyre::ensure!(
        world.blobs.object(&key).wrap_err("read blob")?.is_some(),
        "object {key} was not uploaded"
    );
    Ok(())
}

#[then("no upload is in progress")]
fn upload_idle(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(!world.controller.is_uploading(), "upload flag still set");
    eyre::ensure!(
        world.controller.upload_progress() == UploadProgress::ZERO,
        "progress was not reset"
    );
    Ok(())
}

#[then(r#"task "{id}" is completed"#)]
fn task_completed(world: &mut TaskListWorld, id: String) -> Result<(), eyre::Report> {
    let task = listed_task(world, &id)?;
    eyre::ensure!(task.completed(), "task {id} is still open");
    Ok(())
}
