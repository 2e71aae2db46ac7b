//! Orchestration manifest encoder
//!
//! Declares the two services (database engine, admin UI) as typed structs
//! serialized to YAML. Environment entries are `${VAR}` references into the
//! environment file, never literal values, so the manifest can be shared
//! without leaking credentials. The bridge network pins the internal subnet
//! the access-control compiler trusts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::DeploymentParameters;
use crate::types::{INTERNAL_SUBNET, Role};

/// Image of the database engine service.
pub const POSTGRES_IMAGE: &str = "postgres:16-alpine";

/// Image of the admin-UI service.
pub const PGADMIN_IMAGE: &str = "dpage/pgadmin4:8";

/// Name of the compose bridge network.
pub const NETWORK_NAME: &str = "pgstack";

#[derive(Debug, Serialize, Deserialize)]
pub struct ComposeManifest {
    pub services: BTreeMap<String, Service>,
    pub networks: BTreeMap<String, Network>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Service {
    pub image: String,
    pub container_name: String,
    pub restart: String,
    pub env_file: Vec<String>,
    pub environment: Vec<String>,
    pub ports: Vec<String>,
    pub volumes: Vec<String>,
    pub networks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub depends_on: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Network {
    pub driver: String,
    pub ipam: Ipam,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Ipam {
    pub config: Vec<IpamSubnet>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IpamSubnet {
    pub subnet: String,
}

/// Reference into the environment file for a role's secret.
fn env_reference(role: Role) -> String {
    format!("{var}=${{{var}}}", var = role.env_var())
}

fn database_service(params: &DeploymentParameters) -> Service {
    Service {
        image: POSTGRES_IMAGE.to_string(),
        container_name: "pgstack-db".to_string(),
        restart: "unless-stopped".to_string(),
        env_file: vec![".env".to_string()],
        environment: vec![
            "POSTGRES_USER=${POSTGRES_USER}".to_string(),
            env_reference(Role::Administrator),
            "POSTGRES_DB=${POSTGRES_DB}".to_string(),
        ],
        ports: vec![format!("{}:5432", params.db_port)],
        volumes: vec![
            "./data/postgres:/var/lib/postgresql/data".to_string(),
            "./config/pg_hba.conf:/etc/postgresql/pg_hba.conf:ro".to_string(),
            "./init:/docker-entrypoint-initdb.d:ro".to_string(),
        ],
        networks: vec![NETWORK_NAME.to_string()],
        depends_on: None,
        command: Some(vec![
            "postgres".to_string(),
            "-c".to_string(),
            "hba_file=/etc/postgresql/pg_hba.conf".to_string(),
            "-c".to_string(),
            "shared_preload_libraries=pg_stat_statements".to_string(),
        ]),
    }
}

fn admin_ui_service(params: &DeploymentParameters) -> Service {
    Service {
        image: PGADMIN_IMAGE.to_string(),
        container_name: "pgstack-admin".to_string(),
        restart: "unless-stopped".to_string(),
        env_file: vec![".env".to_string()],
        environment: vec![
            "PGADMIN_DEFAULT_EMAIL=${PGADMIN_DEFAULT_EMAIL}".to_string(),
            env_reference(Role::AdminUi),
        ],
        ports: vec![format!("{}:80", params.admin_ui_port)],
        volumes: vec!["./data/pgadmin:/var/lib/pgadmin".to_string()],
        networks: vec![NETWORK_NAME.to_string()],
        depends_on: Some(vec!["postgres".to_string()]),
        command: None,
    }
}

/// Build the typed manifest for a deployment.
pub fn manifest(params: &DeploymentParameters) -> ComposeManifest {
    let mut services = BTreeMap::new();
    services.insert("postgres".to_string(), database_service(params));
    services.insert("pgadmin".to_string(), admin_ui_service(params));

    let mut networks = BTreeMap::new();
    networks.insert(
        NETWORK_NAME.to_string(),
        Network {
            driver: "bridge".to_string(),
            ipam: Ipam {
                config: vec![IpamSubnet {
                    subnet: INTERNAL_SUBNET.to_string(),
                }],
            },
        },
    );

    ComposeManifest { services, networks }
}

pub fn render(params: &DeploymentParameters) -> String {
    let manifest = manifest(params);
    // Static structure with string keys; serialization cannot fail.
    serde_yaml::to_string(&manifest).expect("compose manifest serializes to YAML")
}
