/// Client against a live server on an ephemeral port

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uptask_api::{
    app::{build_router, AppState},
    config::Config,
};
use uptask_client::{
    types::{LoginForm, ProjectFormData, RegistrationForm, TaskFormData, TaskStatus},
    ClientError, UpTaskClient,
};
use uptask_shared::{
    mail::{
        dispatcher::{MailDispatcher, RetryPolicy},
        recording::RecordingMailer,
    },
    repo::Repositories,
};
use uuid::Uuid;

struct Server {
    client: UpTaskClient,
    mailer: Arc<RecordingMailer>,
    shutdown: CancellationToken,
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn start_server() -> Server {
    let config = Config::from_lookup(|key| match key {
        "FRONTEND_URL" => Some("http://localhost:5173".to_string()),
        "STORAGE" => Some("memory".to_string()),
        _ => None,
    })
    .unwrap();

    let mailer = Arc::new(RecordingMailer::new());
    let shutdown = CancellationToken::new();
    let (mail, _) = MailDispatcher::spawn(mailer.clone(), RetryPolicy::default(), shutdown.clone());
    let app = build_router(AppState::new(Repositories::in_memory(), mail, config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stop = shutdown.clone();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .await
            .unwrap();
    });

    Server {
        client: UpTaskClient::new(&format!("http://{addr}")).unwrap(),
        mailer,
        shutdown,
    }
}

fn project_form(name: &str) -> ProjectFormData {
    ProjectFormData {
        project_name: name.to_string(),
        client_name: "C1".to_string(),
        description: "D1".to_string(),
    }
}

#[tokio::test]
async fn test_project_and_task_round_trip() {
    let server = start_server().await;
    let client = &server.client;

    assert_eq!(client.health().await.unwrap().status, "healthy");

    let project = client.create_project(&project_form("P1")).await.unwrap();
    assert!(project.tasks.is_empty());

    let task = client
        .create_task(
            project.id,
            &TaskFormData {
                name: "T1".to_string(),
                description: "TD1".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(task.project, project.id);
    assert_eq!(task.status, TaskStatus::Pending);

    client
        .update_status(project.id, task.id, TaskStatus::UnderReview)
        .await
        .unwrap();

    let detail = client.get_project(project.id).await.unwrap();
    assert_eq!(detail.tasks.len(), 1);
    assert_eq!(detail.tasks[0].status, TaskStatus::UnderReview);

    let tasks = client.get_tasks(project.id).await.unwrap();
    assert_eq!(tasks[0].project.project_name, "P1");

    let message = client.delete_task(project.id, task.id).await.unwrap();
    assert_eq!(message, "Tarea eliminada correctamente");

    client.delete_project(project.id).await.unwrap();
    assert!(client.get_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_errors_carry_server_messages() {
    let server = start_server().await;
    let client = &server.client;

    match client.get_project(Uuid::new_v4()).await {
        Err(ClientError::Api { status, message, .. }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "Proyecto no encontrado");
        }
        other => panic!("unexpected: {:?}", other),
    }

    match client.create_project(&ProjectFormData::default()).await {
        Err(ClientError::Api { status, errors, .. }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(errors.len(), 3);
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_account_confirmation() {
    let server = start_server().await;
    let client = &server.client;

    client
        .create_account(&RegistrationForm {
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            password: "12345".to_string(),
            password_confirmation: "12345".to_string(),
        })
        .await
        .unwrap();

    let mut code = None;
    for _ in 0..100 {
        if let Some(email) = server.mailer.sent_to("ana@x.com").await.first() {
            code = email
                .text
                .lines()
                .find_map(|line| line.trim().strip_prefix("Código: "))
                .map(str::to_string);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    let code = code.expect("confirmation email");

    client.confirm_account(&code).await.unwrap();

    let login = LoginForm {
        email: "ana@x.com".to_string(),
        password: "12345".to_string(),
    };
    client.login(&login).await.unwrap();

    let err = client.request_confirmation_code("ana@x.com").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
}
