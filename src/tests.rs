#[cfg(test)]
mod integration_tests {
    use crate::auth::TokenSigner;
    use crate::schemas::{ApiResponse, ErrorResponse};
    use crate::test_utils::test_utils::{
        TEST_PASSWORD, TEST_SECRET, create_comment, create_phrase, create_profile, login, register,
        setup_test_server,
    };
    use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
    use axum::body::Bytes;
    use chrono::{DateTime, NaiveDate, Utc};
    use model::entities::Sex;
    use model::entities::prelude::{Comment, Phrase, Profile, User};
    use sea_orm::{EntityTrait, PaginatorTrait};
    use serde_json::{Value, json};
    use std::time::Duration;

    #[tokio::test]
    async fn test_health_check() {
        let (server, _) = setup_test_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_create_user_hides_password() {
        let (server, _) = setup_test_server().await;

        let response = server
            .post("/api/v1/users")
            .json(&json!({
                "username": "alice",
                "email": "alice@sample.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert!(body.success);
        assert_eq!(body.message, "User created successfully");
        assert_eq!(body.data["username"], "alice");
        assert_eq!(body.data["email"], "alice@sample.com");
        assert!(body.data.get("password").is_none());
        assert!(body.data.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let (server, state) = setup_test_server().await;
        register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/users")
            .json(&json!({
                "username": "alice2",
                "email": "alice@SAMPLE.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorResponse = response.json();
        assert!(!body.success);
        assert_eq!(body.code, "EMAIL_ALREADY_EXISTS");
        assert_eq!(User::find().count(&state.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let (server, _) = setup_test_server().await;

        let response = server
            .post("/api/v1/users")
            .json(&json!({
                "username": "bob",
                "email": "bob@sample.com",
                "password": "short",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_ERROR");
        let fields = body.fields.unwrap();
        assert_eq!(fields["password"], vec!["Ensure this field has at least 8 characters."]);
        assert_eq!(fields.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_submission_reports_every_field() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/phrases")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({
                "text": "",
                "text_language": "",
                "translated_word": "  ",
                "translated_word_language": "",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        assert_eq!(fields.len(), 4);
        for field in ["text", "text_language", "translated_word", "translated_word_language"] {
            assert_eq!(fields[field], vec!["This field may not be blank."], "field {}", field);
        }
    }

    #[tokio::test]
    async fn test_missing_fields_are_required() {
        let (server, _) = setup_test_server().await;

        let response = server.post("/api/v1/users").json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        for field in ["username", "email", "password"] {
            assert_eq!(fields[field], vec!["This field is required."], "field {}", field);
        }
    }

    #[tokio::test]
    async fn test_token_roundtrip_and_login_user() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server.get("/api/v1/login_user").add_header(AUTHORIZATION, alice.auth.clone()).await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["id"], alice.id);
        assert_eq!(body.data["email"], alice.email.as_str());
    }

    #[tokio::test]
    async fn test_token_response_shape() {
        let (server, _) = setup_test_server().await;
        register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/auth/token")
            .json(&json!({ "email": "alice@sample.com", "password": TEST_PASSWORD }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["token_type"], "Bearer");
        assert_eq!(body.data["expires_in"], 300);
        assert!(body.data["access"].as_str().unwrap().contains('.'));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let (server, _) = setup_test_server().await;
        register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/auth/token")
            .json(&json!({ "email": "alice@sample.com", "password": "not-the-password" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "INVALID_CREDENTIALS");
        assert_eq!(body.error, "No active account found with the given credentials");
    }

    #[tokio::test]
    async fn test_protected_endpoints_require_token() {
        let (server, _) = setup_test_server().await;

        for path in ["/api/v1/login_user", "/api/v1/phrases", "/api/v1/comments", "/api/v1/languages"] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            let body: ErrorResponse = response.json();
            assert_eq!(body.code, "NOT_AUTHENTICATED", "path {}", path);
        }
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let mut token = alice.auth.to_str().unwrap().to_string();
        token.push('x');

        let response = server
            .get("/api/v1/login_user")
            .add_header(AUTHORIZATION, HeaderValue::from_str(&token).unwrap())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<ErrorResponse>().code, "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let expired = TokenSigner::new(TEST_SECRET, Duration::from_secs(0)).issue(alice.id).unwrap();

        let response = server
            .get("/api/v1/login_user")
            .add_header(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", expired)).unwrap())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<ErrorResponse>().code, "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_token_of_deleted_user_rejected() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        server
            .delete(&format!("/api/v1/users/{}", alice.id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let response = server.get("/api/v1/login_user").add_header(AUTHORIZATION, alice.auth.clone()).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_phrase_and_comment() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let bob = register(&server, "bob", "bob@sample.com").await;

        let response = server
            .post("/api/v1/phrases")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({
                "text": "Good morning",
                "text_language": "en",
                "translated_word": "おはよう",
                "translated_word_language": "jp",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let phrase: ApiResponse<Value> = response.json();
        assert_eq!(phrase.data["user"], alice.id);
        assert_eq!(phrase.data["username"], "alice");
        assert_eq!(phrase.data["comments_count"], 0);
        assert_eq!(phrase.data["translated_word_language"], "jp");
        let phrase_id = phrase.data["id"].as_i64().unwrap();

        let response = server
            .post("/api/v1/comments")
            .add_header(AUTHORIZATION, bob.auth.clone())
            .json(&json!({ "phrase": phrase_id, "text": "素敵", "text_language": "ja" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let comment: ApiResponse<Value> = response.json();
        assert_eq!(comment.data["user"], bob.id);
        assert_eq!(comment.data["phrase"], phrase_id);

        let response = server
            .get(&format!("/api/v1/phrases/{}/comments", phrase_id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await;
        response.assert_status(StatusCode::OK);
        let comments: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(comments.data.len(), 1);
        assert_eq!(comments.data[0]["username"], "bob");

        let response = server
            .get(&format!("/api/v1/phrases/{}", phrase_id))
            .add_header(AUTHORIZATION, bob.auth.clone())
            .await;
        let phrase: ApiResponse<Value> = response.json();
        assert_eq!(phrase.data["comments_count"], 1);
    }

    #[tokio::test]
    async fn test_invalid_language_choice() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/phrases")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({
                "text": "hello",
                "text_language": "xx",
                "translated_word": "hola",
                "translated_word_language": "es",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        assert_eq!(fields["text_language"], vec!["\"xx\" is not a valid choice."]);
    }

    #[tokio::test]
    async fn test_comment_on_missing_phrase() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/comments")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "phrase": 999, "text": "", "text_language": "en" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        assert_eq!(fields["phrase"], vec!["Invalid pk \"999\" - object does not exist."]);
        assert_eq!(fields["text"], vec!["This field may not be blank."]);
    }

    #[tokio::test]
    async fn test_non_owner_cannot_modify_phrase() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let bob = register(&server, "bob", "bob@sample.com").await;
        let phrase_id = create_phrase(&server, &alice).await;
        let path = format!("/api/v1/phrases/{}", phrase_id);

        let body = json!({
            "text": "hijacked",
            "text_language": "en",
            "translated_word": "hijacked",
            "translated_word_language": "en",
        });
        let response = server.put(&path).add_header(AUTHORIZATION, bob.auth.clone()).json(&body).await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json::<ErrorResponse>().code, "PERMISSION_DENIED");

        let response = server
            .patch(&path)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .json(&json!({ "text": "hijacked" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&path)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server.get(&path).add_header(AUTHORIZATION, bob.auth.clone()).await;
        response.assert_status(StatusCode::OK);
        let phrase: ApiResponse<Value> = response.json();
        assert_eq!(phrase.data["text"], "hello");
    }

    #[tokio::test]
    async fn test_non_owner_cannot_modify_user() {
        let (server, state) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let bob = register(&server, "bob", "bob@sample.com").await;

        let response = server
            .patch(&format!("/api/v1/users/{}", alice.id))
            .add_header(AUTHORIZATION, bob.auth.clone())
            .json(&json!({ "username": "mallory" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&format!("/api/v1/users/{}", alice.id))
            .add_header(AUTHORIZATION, bob.auth.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let stored = User::find_by_id(alice.id).one(&state.db).await.unwrap().unwrap();
        assert_eq!(stored.username, "alice");
    }

    #[tokio::test]
    async fn test_not_found_and_forbidden_precede_validation() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let bob = register(&server, "bob", "bob@sample.com").await;
        let phrase_id = create_phrase(&server, &alice).await;

        let response = server
            .put("/api/v1/phrases/999")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<ErrorResponse>().code, "NOT_FOUND");

        let response = server
            .put(&format!("/api/v1/phrases/{}", phrase_id))
            .add_header(AUTHORIZATION, bob.auth.clone())
            .json(&json!({}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_patch_updates_only_supplied_fields() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let phrase_id = create_phrase(&server, &alice).await;
        let path = format!("/api/v1/phrases/{}", phrase_id);

        let before: ApiResponse<Value> = server.get(&path).add_header(AUTHORIZATION, alice.auth.clone()).await.json();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let response = server
            .patch(&path)
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "translated_word": "やあ" }))
            .await;
        response.assert_status(StatusCode::OK);
        let after: ApiResponse<Value> = response.json();

        assert_eq!(after.data["translated_word"], "やあ");
        assert_eq!(after.data["text"], before.data["text"]);
        assert_eq!(after.data["text_language"], before.data["text_language"]);
        assert_eq!(after.data["created_at"], before.data["created_at"]);

        let parse = |value: &Value| value.as_str().unwrap().parse::<DateTime<Utc>>().unwrap();
        assert!(parse(&after.data["updated_at"]) > parse(&before.data["updated_at"]));
    }

    #[tokio::test]
    async fn test_put_requires_every_field() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let phrase_id = create_phrase(&server, &alice).await;
        let path = format!("/api/v1/phrases/{}", phrase_id);

        let response = server
            .put(&path)
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "text": "only text" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        assert_eq!(fields["translated_word"], vec!["This field is required."]);
        assert!(!fields.contains_key("text"));

        let response = server
            .put(&path)
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({
                "text": "Thank you",
                "text_language": "en",
                "translated_word": "Danke",
                "translated_word_language": "de",
            }))
            .await;
        response.assert_status(StatusCode::OK);
        let phrase: ApiResponse<Value> = response.json();
        assert_eq!(phrase.data["text"], "Thank you");
        assert_eq!(phrase.data["translated_word_language"], "de");
    }

    #[tokio::test]
    async fn test_update_own_password() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        server
            .patch(&format!("/api/v1/users/{}", alice.id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "password": "a-new-password" }))
            .await
            .assert_status(StatusCode::OK);

        let token = login(&server, "alice@sample.com", "a-new-password").await;
        assert!(!token.is_empty());

        server
            .post("/api/v1/auth/token")
            .json(&json!({ "email": "alice@sample.com", "password": TEST_PASSWORD }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let (server, state) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        create_profile(&server, &alice).await;
        let phrase_id = create_phrase(&server, &alice).await;
        create_comment(&server, &alice, phrase_id).await;

        server
            .delete(&format!("/api/v1/users/{}", alice.id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(User::find().count(&state.db).await.unwrap(), 0);
        assert_eq!(Profile::find().count(&state.db).await.unwrap(), 0);
        assert_eq!(Phrase::find().count(&state.db).await.unwrap(), 0);
        assert_eq!(Comment::find().count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_user_removes_comments_on_its_phrases() {
        let (server, state) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let bob = register(&server, "bob", "bob@sample.com").await;
        let phrase_id = create_phrase(&server, &alice).await;
        create_comment(&server, &bob, phrase_id).await;
        let bobs_phrase = create_phrase(&server, &bob).await;
        create_comment(&server, &alice, bobs_phrase).await;

        server
            .delete(&format!("/api/v1/users/{}", alice.id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(User::find().count(&state.db).await.unwrap(), 1);
        assert_eq!(Phrase::find().count(&state.db).await.unwrap(), 1);
        assert_eq!(Comment::find().count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_phrase_keeps_user() {
        let (server, state) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let bob = register(&server, "bob", "bob@sample.com").await;
        let phrase_id = create_phrase(&server, &alice).await;
        create_comment(&server, &bob, phrase_id).await;

        server
            .delete(&format!("/api/v1/phrases/{}", phrase_id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(User::find().count(&state.db).await.unwrap(), 2);
        assert_eq!(Phrase::find().count(&state.db).await.unwrap(), 0);
        assert_eq!(Comment::find().count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_comment_keeps_phrase() {
        let (server, state) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let phrase_id = create_phrase(&server, &alice).await;
        let comment_id = create_comment(&server, &alice, phrase_id).await;

        server
            .delete(&format!("/api/v1/comments/{}", comment_id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(User::find().count(&state.db).await.unwrap(), 1);
        assert_eq!(Phrase::find().count(&state.db).await.unwrap(), 1);
        assert_eq!(Comment::find().count(&state.db).await.unwrap(), 0);

        server
            .get(&format!("/api/v1/comments/{}", comment_id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_profile_lifecycle() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let profile_id = create_profile(&server, &alice).await;

        let response = server
            .post("/api/v1/profiles")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "sex": "another", "date_of_birth": "1991-01-01" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<ErrorResponse>().code, "PROFILE_ALREADY_EXISTS");

        let response = server
            .patch(&format!("/api/v1/profiles/{}", profile_id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "sex": "another" }))
            .await;
        response.assert_status(StatusCode::OK);
        let profile: ApiResponse<Value> = response.json();
        assert_eq!(profile.data["sex"], "another");
        assert_eq!(profile.data["date_of_birth"], "1990-04-01");
        assert_eq!(profile.data["username"], "alice");
        assert_eq!(profile.data["user"], alice.id);
    }

    #[tokio::test]
    async fn test_profile_validation_messages() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/profiles")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "sex": "female", "date_of_birth": "01/04/1990" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        assert_eq!(fields["sex"], vec!["\"female\" is not a valid choice."]);
        assert_eq!(fields["date_of_birth"], vec!["Date has wrong format. Use YYYY-MM-DD."]);
    }

    #[tokio::test]
    async fn test_languages_registry() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server.get("/api/v1/languages").add_header(AUTHORIZATION, alice.auth.clone()).await;
        response.assert_status(StatusCode::OK);
        let languages: ApiResponse<Vec<Value>> = response.json();
        let codes: Vec<&str> = languages.data.iter().filter_map(|l| l["code"].as_str()).collect();
        assert!(codes.contains(&"en"));
        assert!(codes.contains(&"ja"));
        assert!(codes.contains(&"jp"));

        let response = server.get("/api/v1/languages/fil").add_header(AUTHORIZATION, alice.auth.clone()).await;
        response.assert_status(StatusCode::OK);
        let language: ApiResponse<Value> = response.json();
        assert_eq!(language.data["name"], "Filipino");

        server
            .get("/api/v1/languages/xx")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let bob = register(&server, "bob", "bob@sample.com").await;
        let first = create_phrase(&server, &alice).await;
        let second = create_phrase(&server, &alice).await;
        create_phrase(&server, &bob).await;
        create_comment(&server, &bob, first).await;
        create_comment(&server, &bob, second).await;

        let response = server
            .get("/api/v1/phrases")
            .add_query_param("user", alice.id)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .await;
        response.assert_status(StatusCode::OK);
        let phrases: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(phrases.data.len(), 2);
        assert!(phrases.data.iter().all(|p| p["user"] == alice.id));
        assert!(phrases.data.iter().all(|p| p["comments_count"] == 1));

        let response = server
            .get("/api/v1/phrases")
            .add_query_param("page", 2)
            .add_query_param("page_size", 2)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .await;
        let phrases: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(phrases.data.len(), 1);
        assert_eq!(phrases.data[0]["user"], bob.id);

        let response = server
            .get("/api/v1/comments")
            .add_query_param("phrase", second)
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await;
        let comments: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(comments.data.len(), 1);
        assert_eq!(comments.data[0]["phrase"], second);
    }

    #[tokio::test]
    async fn test_page_size_out_of_range() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server
            .get("/api/v1/phrases")
            .add_query_param("page_size", 0)
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert_eq!(error.fields.unwrap()["page_size"], vec!["Ensure this value is between 1 and 1000."]);

        let response = server
            .get("/api/v1/comments")
            .add_query_param("page", "abc")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        assert_eq!(fields["page"], vec!["A valid integer is required."]);
    }

    #[tokio::test]
    async fn test_wrong_types_are_field_errors() {
        let (server, state) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/phrases")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({
                "text": 5,
                "text_language": "en",
                "translated_word": "five",
                "translated_word_language": "en",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert_eq!(error.fields.unwrap()["text"], vec!["Not a valid string."]);

        let response = server
            .post("/api/v1/comments")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "phrase": "abc", "text": "hi", "text_language": "en" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        assert_eq!(fields["phrase"], vec!["A valid integer is required."]);
        assert_eq!(Comment::find().count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_bodies_use_error_envelope() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/phrases")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .bytes(Bytes::from_static(b"{\"text\": "))
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "PARSE_ERROR");
        assert!(error.error.starts_with("JSON parse error"));

        let response = server
            .post("/api/v1/phrases")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!(["hello"]))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        assert_eq!(
            fields["non_field_errors"],
            vec!["Invalid data. Expected a dictionary, but got list."]
        );

        let response = server
            .post("/api/v1/phrases")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .text("hello")
            .await;
        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(response.json::<ErrorResponse>().code, "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_not_found() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server
            .get("/api/v1/phrases/abc")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<ErrorResponse>().code, "NOT_FOUND");

        let response = server.get("/api/v1/nothing-here").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<ErrorResponse>().error, "Resource not found.");
    }

    #[tokio::test]
    async fn test_patch_rejects_explicit_null() {
        let (server, state) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let phrase_id = create_phrase(&server, &alice).await;

        let response = server
            .patch(&format!("/api/v1/phrases/{}", phrase_id))
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "text": null, "translated_word": "やあ" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let fields = response.json::<ErrorResponse>().fields.unwrap();
        assert_eq!(fields["text"], vec!["This field may not be null."]);

        let stored = Phrase::find_by_id(phrase_id).one(&state.db).await.unwrap().unwrap();
        assert_eq!(stored.text, "hello");
        assert_eq!(stored.translated_word, "こんにちは");
    }

    #[tokio::test]
    async fn test_non_owner_cannot_modify_profile() {
        let (server, state) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let bob = register(&server, "bob", "bob@sample.com").await;
        let profile_id = create_profile(&server, &alice).await;
        let path = format!("/api/v1/profiles/{}", profile_id);

        let response = server
            .put(&path)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .json(&json!({ "sex": "men", "date_of_birth": "1970-01-01" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json::<ErrorResponse>().code, "PERMISSION_DENIED");

        server
            .patch(&path)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .json(&json!({ "sex": "another" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&path)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let stored = Profile::find_by_id(profile_id).one(&state.db).await.unwrap().unwrap();
        assert_eq!(stored.user_id, alice.id);
        assert_eq!(stored.sex, Sex::Women);
        assert_eq!(stored.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 1).unwrap());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_modify_comment() {
        let (server, state) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let bob = register(&server, "bob", "bob@sample.com").await;
        let phrase_id = create_phrase(&server, &bob).await;
        let comment_id = create_comment(&server, &alice, phrase_id).await;
        let path = format!("/api/v1/comments/{}", comment_id);

        let response = server
            .put(&path)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .json(&json!({ "phrase": phrase_id, "text": "hijacked", "text_language": "ja" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json::<ErrorResponse>().code, "PERMISSION_DENIED");

        server
            .patch(&path)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .json(&json!({ "text": "hijacked" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&path)
            .add_header(AUTHORIZATION, bob.auth.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let stored = Comment::find_by_id(comment_id).one(&state.db).await.unwrap().unwrap();
        assert_eq!(stored.user_id, alice.id);
        assert_eq!(stored.text, "nice one");
        assert_eq!(stored.phrase_id, phrase_id);
    }

    #[tokio::test]
    async fn test_profile_put_bumps_updated_at() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;
        let profile_id = create_profile(&server, &alice).await;
        let path = format!("/api/v1/profiles/{}", profile_id);

        let before: ApiResponse<Value> = server.get(&path).add_header(AUTHORIZATION, alice.auth.clone()).await.json();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let response = server
            .put(&path)
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "sex": "another", "date_of_birth": "1991-05-06" }))
            .await;
        response.assert_status(StatusCode::OK);
        let after: ApiResponse<Value> = response.json();

        assert_eq!(after.data["sex"], "another");
        assert_eq!(after.data["date_of_birth"], "1991-05-06");
        assert_eq!(after.data["created_at"], before.data["created_at"]);

        let parse = |value: &Value| value.as_str().unwrap().parse::<DateTime<Utc>>().unwrap();
        assert!(parse(&after.data["updated_at"]) > parse(&before.data["updated_at"]));
    }

    #[tokio::test]
    async fn test_free_text_is_trimmed() {
        let (server, _) = setup_test_server().await;
        let alice = register(&server, "alice", "alice@sample.com").await;

        let response = server
            .post("/api/v1/phrases")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({
                "text": "  hi  ",
                "text_language": "en",
                "translated_word": " やあ ",
                "translated_word_language": "ja",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let phrase: ApiResponse<Value> = response.json();
        assert_eq!(phrase.data["text"], "hi");
        assert_eq!(phrase.data["translated_word"], "やあ");

        let response = server
            .post("/api/v1/comments")
            .add_header(AUTHORIZATION, alice.auth.clone())
            .json(&json!({ "phrase": phrase.data["id"], "text": "\tnice ", "text_language": "en" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let comment: ApiResponse<Value> = response.json();
        assert_eq!(comment.data["text"], "nice");
    }
}
