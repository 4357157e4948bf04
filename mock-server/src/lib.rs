use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use axum::{extract::State, routing::post, Json, Router};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ENDPOINT: &str = "/index.php/admin/remotecontrol";

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "password";

pub const DEMO_SURVEY: u64 = 123456;
pub const EMPTY_SURVEY: u64 = 222222;
pub const NO_TABLE_SURVEY: u64 = 333333;

#[derive(Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct Participant {
    pub tid: u64,
    pub token: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    /// `"N"` until the participant submits.
    pub completed: String,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct Survey {
    pub title: String,
    /// `None` when the survey has no participant table.
    pub participants: Option<BTreeMap<u64, Participant>>,
}

/// In-memory state of the service.
#[derive(Debug, Default)]
pub struct Store {
    pub users: HashMap<String, String>,
    pub keys: HashSet<String>,
    pub surveys: BTreeMap<u64, Survey>,
}

pub type Db = Arc<RwLock<Store>>;

fn participant(tid: u64, firstname: &str, lastname: &str, completed: &str, colour: &str) -> Participant {
    Participant {
        tid,
        token: format!("token{tid}"),
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        email: format!("{}@example.org", firstname.to_lowercase()),
        completed: completed.to_string(),
        attributes: BTreeMap::from([("attribute_1".to_string(), colour.to_string())]),
    }
}

impl Store {
    /// One admin account and three surveys: populated, empty, and without
    /// a participant table.
    pub fn demo() -> Self {
        let participants = [
            participant(1, "Ada", "Lovelace", "N", "blue"),
            participant(2, "Alan", "Turing", "2016-05-01 10:00", "green"),
            participant(3, "Grace", "Hopper", "N", "red"),
        ];
        let mut surveys = BTreeMap::new();
        surveys.insert(
            DEMO_SURVEY,
            Survey {
                title: "Demo survey".to_string(),
                participants: Some(participants.into_iter().map(|p| (p.tid, p)).collect()),
            },
        );
        surveys.insert(
            EMPTY_SURVEY,
            Survey {
                title: "Empty survey".to_string(),
                participants: Some(BTreeMap::new()),
            },
        );
        surveys.insert(
            NO_TABLE_SURVEY,
            Survey {
                title: "Survey without participants table".to_string(),
                participants: None,
            },
        );
        Self {
            users: HashMap::from([(USERNAME.to_string(), PASSWORD.to_string())]),
            keys: HashSet::new(),
            surveys,
        }
    }

    /// Run one method. Failures the real service reports as
    /// `{"status": ...}` results are `Ok` here too.
    pub fn dispatch(&mut self, method: &str, params: &[Value]) -> Result<Value, RpcError> {
        match method {
            "get_session_key" => Ok(self.get_session_key(params)),
            "release_session_key" => Ok(self.release_session_key(params)),
            "list_surveys" => Ok(self.list_surveys(params)),
            "list_participants" => Ok(self.list_participants(params)),
            "get_participant_properties" => Ok(self.get_participant_properties(params)),
            "delete_participants" => Ok(self.delete_participants(params)),
            _ => Err(RpcError {
                code: -32601,
                message: "Method not found".to_string(),
            }),
        }
    }

    fn get_session_key(&mut self, params: &[Value]) -> Value {
        let username = str_param(params, 0);
        let password = str_param(params, 1);
        match (username, password) {
            (Some(u), Some(p)) if self.users.get(u).map(String::as_str) == Some(p) => {
                let key = Uuid::new_v4().simple().to_string();
                self.keys.insert(key.clone());
                Value::String(key)
            }
            _ => status("Invalid user name or password"),
        }
    }

    fn release_session_key(&mut self, params: &[Value]) -> Value {
        if let Some(key) = str_param(params, 0) {
            self.keys.remove(key);
        }
        Value::String("OK".to_string())
    }

    fn authorized(&self, params: &[Value]) -> bool {
        str_param(params, 0).is_some_and(|key| self.keys.contains(key))
    }

    fn list_surveys(&self, params: &[Value]) -> Value {
        if !self.authorized(params) {
            return status("Invalid session key");
        }
        if self.surveys.is_empty() {
            return status("No surveys found");
        }
        self.surveys
            .iter()
            .map(|(sid, survey)| {
                json!({
                    "sid": sid.to_string(),
                    "surveyls_title": survey.title,
                    "startdate": null,
                    "expires": null,
                    "active": "Y",
                })
            })
            .collect()
    }

    fn participant_table(&self, params: &[Value]) -> Result<&BTreeMap<u64, Participant>, Value> {
        if !self.authorized(params) {
            return Err(status("Invalid session key"));
        }
        let survey = u64_param(params, 1)
            .and_then(|sid| self.surveys.get(&sid))
            .ok_or_else(|| status("Error: Invalid survey ID"))?;
        survey.participants.as_ref().ok_or_else(|| status("Error: No token table"))
    }

    fn list_participants(&self, params: &[Value]) -> Value {
        let table = match self.participant_table(params) {
            Ok(table) => table,
            Err(status) => return status,
        };
        let start = u64_param(params, 2).unwrap_or(0) as usize;
        let limit = u64_param(params, 3).unwrap_or(10) as usize;
        let unused = params.get(4).and_then(Value::as_bool).unwrap_or(false);
        let attributes = params.get(5).cloned().unwrap_or(Value::Bool(false));

        let listed: Vec<Value> = table
            .values()
            .filter(|p| !unused || p.completed == "N")
            .skip(start)
            .take(limit)
            .map(|p| {
                let mut entry = json!({
                    "tid": p.tid.to_string(),
                    "token": p.token,
                    "participant_info": {
                        "firstname": p.firstname,
                        "lastname": p.lastname,
                        "email": p.email,
                    },
                });
                for (name, value) in &p.attributes {
                    if wants_attribute(&attributes, name) {
                        entry[name.as_str()] = Value::String(value.clone());
                    }
                }
                entry
            })
            .collect();

        if listed.is_empty() {
            return status("No Tokens found");
        }
        Value::Array(listed)
    }

    fn get_participant_properties(&self, params: &[Value]) -> Value {
        let table = match self.participant_table(params) {
            Ok(table) => table,
            Err(status) => return status,
        };
        let Some(p) = u64_param(params, 2).and_then(|tid| table.get(&tid)) else {
            return status("Error: No results were found based on your attributes.");
        };

        let mut properties = serde_json::Map::new();
        properties.insert("tid".to_string(), Value::String(p.tid.to_string()));
        properties.insert("token".to_string(), Value::String(p.token.clone()));
        properties.insert("firstname".to_string(), Value::String(p.firstname.clone()));
        properties.insert("lastname".to_string(), Value::String(p.lastname.clone()));
        properties.insert("email".to_string(), Value::String(p.email.clone()));
        properties.insert("completed".to_string(), Value::String(p.completed.clone()));
        for (name, value) in &p.attributes {
            properties.insert(name.clone(), Value::String(value.clone()));
        }

        match params.get(3).and_then(Value::as_array) {
            Some(names) => names
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|name| properties.get(name).map(|v| (name.to_string(), v.clone())))
                .collect::<serde_json::Map<_, _>>()
                .into(),
            None => Value::Object(properties),
        }
    }

    fn delete_participants(&mut self, params: &[Value]) -> Value {
        if let Err(status) = self.participant_table(params) {
            return status;
        }
        let Some(table) = u64_param(params, 1)
            .and_then(|sid| self.surveys.get_mut(&sid))
            .and_then(|survey| survey.participants.as_mut())
        else {
            return status("Error: Invalid survey ID");
        };
        let tids = params.get(2).and_then(Value::as_array).cloned().unwrap_or_default();

        let mut report = serde_json::Map::new();
        for tid in tids {
            let Some(id) = as_u64(&tid) else { continue };
            let verdict = if table.remove(&id).is_some() {
                "Deleted"
            } else {
                "Invalid token ID"
            };
            report.insert(id.to_string(), Value::String(verdict.to_string()));
        }
        Value::Object(report)
    }
}

fn status(text: &str) -> Value {
    json!({ "status": text })
}

fn wants_attribute(selection: &Value, name: &str) -> bool {
    match selection {
        Value::Bool(all) => *all,
        Value::Array(names) => names.iter().any(|n| n.as_str() == Some(name)),
        _ => false,
    }
}

fn str_param(params: &[Value], index: usize) -> Option<&str> {
    params.get(index).and_then(Value::as_str)
}

fn u64_param(params: &[Value], index: usize) -> Option<u64> {
    params.get(index).and_then(as_u64)
}

/// The service accepts ids as numbers or numeric strings.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn app() -> Router {
    app_with(Store::demo())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new().route(ENDPOINT, post(remote_control)).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn remote_control(State(db): State<Db>, Json(request): Json<RpcRequest>) -> Json<Value> {
    debug!("{} {:?}", request.method, request.id);
    let outcome = db.write().await.dispatch(&request.method, &request.params);
    let (result, error) = match outcome {
        Ok(result) => (result, Value::Null),
        Err(err) => (Value::Null, json!(err)),
    };
    Json(json!({ "id": request.id, "result": result, "error": error }))
}
