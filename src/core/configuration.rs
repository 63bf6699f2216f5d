use serde::Deserialize;
use std::{
    fs,
    path::Path,
};
use tokio::{fs::File, io::AsyncReadExt};

#[derive(Deserialize, Clone, Debug)]
pub struct Configuration {
    pub api: ApiConfiguration,
    pub app: AppConfiguration,
    pub core: CoreConfiguration,
    pub log: LogConfiguration,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiConfiguration {
    pub host: Option<String>,
    pub use_tls: Option<bool>,
    /// seconds between two authorization polls
    pub pooling_interval: Option<u64>,
    /// overall window in seconds before registration gives up
    pub pooling_timeout: Option<u64>,
}

/// Identity presented to the device; what the user approves on the LCD
/// screen. The device name defaults to the local hostname.
#[derive(Deserialize, Clone, Debug)]
pub struct AppConfiguration {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub device_name: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CoreConfiguration {
    pub data_directory: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LogConfiguration {
    pub level: Option<String>,
    pub retention: Option<usize>,
}

impl Configuration {
    pub fn assert_data_dir_permissions(&self) -> Result<(), &str> {
        let data_dir = match self.core.data_directory.as_ref() {
            Some(d) => d.to_owned(),
            None => return Err("data_dir is not set"),
        };

        let path = Path::new(&data_dir);

        if !path.try_exists().unwrap_or(false) {
            return Err("data dir does not exist");
        }

        let permissions = match fs::metadata(path) {
            Ok(m) => m.permissions(),
            Err(_) => return Err("cannot read data dir metadata"),
        };

        if permissions.readonly() {
            return Err("data_dir cannot be readonly");
        }

        Ok(())
    }
}

pub async fn get_configuration(
    file_path: String,
) -> Result<Configuration, Box<dyn std::error::Error + Send + Sync>> {
    let path = Path::new(&file_path);

    if !path.exists() {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("configuration file is missing: {file_path}"),
        )));
    }

    let mut file = File::open(path).await?;
    let mut buffer = vec![];

    file.read_to_end(&mut buffer).await?;

    let result = String::from_utf8(buffer)?;

    Ok(toml::from_str::<Configuration>(&result)?)
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use tokio::{
        fs::{self, File},
        io::AsyncWriteExt,
    };

    use crate::core::configuration::{
        get_configuration, ApiConfiguration, AppConfiguration, Configuration, CoreConfiguration,
        LogConfiguration,
    };

    async fn create_sample_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if path.exists() {
            fs::remove_file(path)
                .await
                .expect("cannot remove sample configuration file");
        }

        let mut file = File::create(path)
            .await
            .expect("cannot create sample configuration file");
        let content = "[api]
host = \"mafreebox.freebox.fr\"
use_tls = true

# authorization poll cadence, in seconds
pooling_interval = 2
pooling_timeout = 120

[app]
id = \"fr.freebox.testapp\"
name = \"Test App\"
version = \"0.0.7\"

[core]
data_directory = \".\"

[log]
level = \"Info\"
retention = 31";

        file.write_all(content.as_bytes())
            .await
            .expect("cannot write to sample configuration file");
        file.shutdown().await?;

        Ok(())
    }

    #[tokio::test]
    async fn should_match_expected_values() {
        let path = Path::new("./test_conf.toml");

        create_sample_file(path).await.unwrap();

        let conf = get_configuration("./test_conf.toml".to_string())
            .await
            .expect("cannot load configuration");

        fs::remove_file(path)
            .await
            .expect("cannot cleanup sample configuration file");

        assert_eq!("mafreebox.freebox.fr", conf.api.host.unwrap());
        assert_eq!(true, conf.api.use_tls.unwrap());
        assert_eq!(2, conf.api.pooling_interval.unwrap());
        assert_eq!(120, conf.api.pooling_timeout.unwrap());

        assert_eq!("fr.freebox.testapp", conf.app.id.unwrap());
        assert_eq!("Test App", conf.app.name.unwrap());
        assert_eq!("0.0.7", conf.app.version.unwrap());
        assert!(conf.app.device_name.is_none());

        assert_eq!(".".to_string(), conf.core.data_directory.unwrap());
        assert_eq!("Info", conf.log.level.unwrap());
        assert_eq!(31, conf.log.retention.unwrap());
    }

    fn conf_with_data_dir(data_directory: Option<&str>) -> Configuration {
        Configuration {
            api: ApiConfiguration {
                host: None,
                use_tls: None,
                pooling_interval: None,
                pooling_timeout: None,
            },
            app: AppConfiguration {
                id: None,
                name: None,
                version: None,
                device_name: None,
            },
            core: CoreConfiguration {
                data_directory: data_directory.map(str::to_string),
            },
            log: LogConfiguration {
                level: None,
                retention: None,
            },
        }
    }

    #[test]
    fn assert_data_dir_permissions_tests() {
        assert_eq!(
            true,
            conf_with_data_dir(Some("nowhere"))
                .assert_data_dir_permissions()
                .is_err()
        );
        assert_eq!(
            true,
            conf_with_data_dir(Some(""))
                .assert_data_dir_permissions()
                .is_err()
        );
        assert_eq!(
            true,
            conf_with_data_dir(None)
                .assert_data_dir_permissions()
                .is_err()
        );
        assert_eq!(
            true,
            conf_with_data_dir(Some("."))
                .assert_data_dir_permissions()
                .is_ok()
        );
    }
}
