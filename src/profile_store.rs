use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::FEATURE_LEN;

/// Carpeta raíz por defecto donde vive cada perfil de usuario
pub const DIR_PERFILES: &str = "PERFILES";

const PREFIJO_SESION: &str = "entrenamiento_";
const EXTENSION_SESION: &str = ".json";

/// Una sesión de captura: vectores de características etiquetados por
/// los dos cubos de entrenamiento. Se persiste una sola vez y no se
/// modifica después.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingSession {
    #[serde(rename = "PERFECTO")]
    pub perfecto: Vec<Vec<f32>>,
    #[serde(rename = "MALO")]
    pub malo: Vec<Vec<f32>>,
}

impl TrainingSession {
    /// Una sesión solo se guarda si ambos cubos tienen muestras
    pub fn esta_completa(&self) -> bool {
        !self.perfecto.is_empty() && !self.malo.is_empty()
    }

    /// Todos los vectores deben medir exactamente `FEATURE_LEN`
    fn aridad_valida(&self) -> bool {
        self.perfecto
            .iter()
            .chain(self.malo.iter())
            .all(|v| v.len() == FEATURE_LEN)
    }
}

/// Unión transitoria de todas las sesiones guardadas de un perfil.
/// Se reconstruye en cada entrenamiento; nunca se cachea entre corridas.
#[derive(Debug, Clone, Default)]
pub struct ConsolidatedDataset {
    pub perfecto: Vec<Vec<f32>>,
    pub malo: Vec<Vec<f32>>,
}

impl ConsolidatedDataset {
    /// Entrenable solo con al menos una muestra en cada cubo
    pub fn es_entrenable(&self) -> bool {
        !self.perfecto.is_empty() && !self.malo.is_empty()
    }

    pub fn total_muestras(&self) -> usize {
        self.perfecto.len() + self.malo.len()
    }
}

/// Acceso al almacenamiento de perfiles: un directorio por perfil bajo
/// la raíz, con archivos de sesión numerados dentro.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    raiz: PathBuf,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new(DIR_PERFILES)
    }
}

impl ProfileStore {
    pub fn new(raiz: impl Into<PathBuf>) -> Self {
        Self { raiz: raiz.into() }
    }

    pub fn raiz(&self) -> &Path {
        &self.raiz
    }

    /// Nombres de todos los perfiles existentes (subcarpetas de la raíz),
    /// ordenados. Si la raíz no existe todavía, no hay perfiles.
    pub fn listar_perfiles(&self) -> Vec<String> {
        let entradas = match fs::read_dir(&self.raiz) {
            Ok(entradas) => entradas,
            Err(_) => return Vec::new(),
        };

        let mut perfiles: Vec<String> = entradas
            .filter_map(|entrada| entrada.ok())
            .filter(|entrada| entrada.path().is_dir())
            .filter_map(|entrada| entrada.file_name().into_string().ok())
            .collect();

        perfiles.sort();
        perfiles
    }

    /// Devuelve la carpeta de un perfil y se asegura de que exista
    pub fn asegurar_perfil(&self, nombre: &str) -> Result<PathBuf> {
        let ruta = self.raiz.join(nombre);
        fs::create_dir_all(&ruta)
            .with_context(|| format!("no se pudo crear la carpeta del perfil {:?}", ruta))?;
        Ok(ruta)
    }

    /// Guarda la sesión como un nuevo archivo `entrenamiento_NNN.json`.
    ///
    /// El número de secuencia parte del conteo de sesiones existentes + 1
    /// y se incrementa hasta encontrar un nombre libre: nunca se
    /// sobrescribe una sesión ya guardada. Un fallo de escritura es fatal
    /// para esta operación y se propaga al llamador.
    pub fn guardar_sesion(&self, nombre: &str, sesion: &TrainingSession) -> Result<PathBuf> {
        let ruta_perfil = self.asegurar_perfil(nombre)?;

        let mut version = archivos_de_sesion(&ruta_perfil).len() + 1;
        let mut ruta = ruta_perfil.join(nombre_de_sesion(version));
        while ruta.exists() {
            version += 1;
            ruta = ruta_perfil.join(nombre_de_sesion(version));
        }

        let contenido = serde_json::to_string_pretty(sesion)
            .context("no se pudo serializar la sesión de entrenamiento")?;
        fs::write(&ruta, contenido)
            .with_context(|| format!("no se pudo escribir la sesión en {:?}", ruta))?;

        println!(
            "[INFO] Sesión de entrenamiento guardada como: {}",
            nombre_de_sesion(version)
        );
        Ok(ruta)
    }

    /// Carga y consolida TODOS los datos brutos de entrenamiento del
    /// perfil. Un archivo ilegible, corrupto o al que le falte un cubo se
    /// omite con un aviso; la carga parcial es el comportamiento esperado.
    /// Un perfil sin sesiones produce un dataset vacío (no entrenable).
    pub fn cargar_todas_las_sesiones(&self, nombre: &str) -> Result<ConsolidatedDataset> {
        let ruta_perfil = self.asegurar_perfil(nombre)?;

        let mut datos = ConsolidatedDataset::default();

        for archivo in archivos_de_sesion(&ruta_perfil) {
            let contenido = match fs::read_to_string(&archivo) {
                Ok(contenido) => contenido,
                Err(e) => {
                    eprintln!("[AVISO] Se omite sesión ilegible {:?}: {}", archivo, e);
                    continue;
                }
            };

            let sesion: TrainingSession = match serde_json::from_str(&contenido) {
                Ok(sesion) => sesion,
                Err(e) => {
                    eprintln!("[AVISO] Se omite sesión corrupta {:?}: {}", archivo, e);
                    continue;
                }
            };

            if !sesion.aridad_valida() {
                eprintln!(
                    "[AVISO] Se omite sesión con vectores de longitud distinta a {}: {:?}",
                    FEATURE_LEN, archivo
                );
                continue;
            }

            datos.perfecto.extend(sesion.perfecto);
            datos.malo.extend(sesion.malo);
        }

        Ok(datos)
    }
}

fn nombre_de_sesion(version: usize) -> String {
    format!("{}{:03}{}", PREFIJO_SESION, version, EXTENSION_SESION)
}

/// Archivos `entrenamiento_NNN.json` del perfil, en orden de nombre
fn archivos_de_sesion(ruta_perfil: &Path) -> Vec<PathBuf> {
    let entradas = match fs::read_dir(ruta_perfil) {
        Ok(entradas) => entradas,
        Err(_) => return Vec::new(),
    };

    let mut archivos: Vec<PathBuf> = entradas
        .filter_map(|entrada| entrada.ok())
        .map(|entrada| entrada.path())
        .filter(|ruta| es_archivo_de_sesion(ruta))
        .collect();

    archivos.sort();
    archivos
}

fn es_archivo_de_sesion(ruta: &Path) -> bool {
    let nombre = match ruta.file_name().and_then(|n| n.to_str()) {
        Some(nombre) => nombre,
        None => return false,
    };

    nombre
        .strip_prefix(PREFIJO_SESION)
        .and_then(|resto| resto.strip_suffix(EXTENSION_SESION))
        .map_or(false, |numero| {
            !numero.is_empty() && numero.chars().all(|c| c.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raiz_de_pruebas(caso: &str) -> PathBuf {
        let raiz = std::env::temp_dir().join(format!(
            "postura_perfiles_{}_{}",
            caso,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&raiz);
        raiz
    }

    fn vector(valor: f32) -> Vec<f32> {
        vec![valor; FEATURE_LEN]
    }

    fn sesion_de_prueba() -> TrainingSession {
        TrainingSession {
            perfecto: vec![vector(0.5), vector(0.6)],
            malo: vec![vector(-0.5)],
        }
    }

    #[test]
    fn test_listar_sin_raiz_devuelve_vacio() {
        let store = ProfileStore::new(raiz_de_pruebas("sin_raiz"));
        assert!(store.listar_perfiles().is_empty());
    }

    #[test]
    fn test_asegurar_perfil_es_idempotente() {
        let raiz = raiz_de_pruebas("asegurar");
        let store = ProfileStore::new(&raiz);

        let ruta1 = store.asegurar_perfil("ana").unwrap();
        let ruta2 = store.asegurar_perfil("ana").unwrap();
        assert_eq!(ruta1, ruta2);
        assert!(ruta1.is_dir());
        assert_eq!(store.listar_perfiles(), vec!["ana".to_string()]);

        let _ = fs::remove_dir_all(&raiz);
    }

    #[test]
    fn test_guardar_y_cargar_ida_y_vuelta() {
        let raiz = raiz_de_pruebas("ida_vuelta");
        let store = ProfileStore::new(&raiz);
        let sesion = sesion_de_prueba();

        store.guardar_sesion("ana", &sesion).unwrap();
        let datos = store.cargar_todas_las_sesiones("ana").unwrap();

        assert_eq!(datos.perfecto, sesion.perfecto);
        assert_eq!(datos.malo, sesion.malo);
        assert!(datos.es_entrenable());

        let _ = fs::remove_dir_all(&raiz);
    }

    #[test]
    fn test_guardados_consecutivos_no_sobrescriben() {
        let raiz = raiz_de_pruebas("consecutivos");
        let store = ProfileStore::new(&raiz);

        let ruta1 = store.guardar_sesion("ana", &sesion_de_prueba()).unwrap();
        let ruta2 = store.guardar_sesion("ana", &sesion_de_prueba()).unwrap();

        assert_ne!(ruta1, ruta2);
        assert!(ruta1.ends_with("entrenamiento_001.json"));
        assert!(ruta2.ends_with("entrenamiento_002.json"));

        let datos = store.cargar_todas_las_sesiones("ana").unwrap();
        assert_eq!(datos.perfecto.len(), 4);
        assert_eq!(datos.malo.len(), 2);

        let _ = fs::remove_dir_all(&raiz);
    }

    #[test]
    fn test_numeracion_salta_archivos_existentes() {
        let raiz = raiz_de_pruebas("colision");
        let store = ProfileStore::new(&raiz);
        let ruta_perfil = store.asegurar_perfil("ana").unwrap();

        // Hueco artificial: solo existe la sesión 002
        fs::write(
            ruta_perfil.join("entrenamiento_002.json"),
            serde_json::to_string(&sesion_de_prueba()).unwrap(),
        )
        .unwrap();

        // conteo = 1 → candidata 002, ocupada → se corre a 003
        let ruta = store.guardar_sesion("ana", &sesion_de_prueba()).unwrap();
        assert!(ruta.ends_with("entrenamiento_003.json"));

        let _ = fs::remove_dir_all(&raiz);
    }

    #[test]
    fn test_sesion_corrupta_se_omite() {
        let raiz = raiz_de_pruebas("corrupta");
        let store = ProfileStore::new(&raiz);
        let ruta_perfil = store.asegurar_perfil("ana").unwrap();

        store.guardar_sesion("ana", &sesion_de_prueba()).unwrap();
        fs::write(ruta_perfil.join("entrenamiento_099.json"), "esto no es json").unwrap();
        // A esta le falta el cubo MALO: se omite entera, no se fusiona a medias
        fs::write(
            ruta_perfil.join("entrenamiento_098.json"),
            "{\"PERFECTO\": [[0.1]]}",
        )
        .unwrap();

        let datos = store.cargar_todas_las_sesiones("ana").unwrap();
        assert_eq!(datos.perfecto.len(), 2);
        assert_eq!(datos.malo.len(), 1);

        let _ = fs::remove_dir_all(&raiz);
    }

    #[test]
    fn test_vectores_de_longitud_incorrecta_se_omiten() {
        let raiz = raiz_de_pruebas("aridad");
        let store = ProfileStore::new(&raiz);
        let ruta_perfil = store.asegurar_perfil("ana").unwrap();

        let invalida = TrainingSession {
            perfecto: vec![vec![0.1, 0.2]],
            malo: vec![vector(-0.5)],
        };
        fs::write(
            ruta_perfil.join("entrenamiento_001.json"),
            serde_json::to_string(&invalida).unwrap(),
        )
        .unwrap();

        let datos = store.cargar_todas_las_sesiones("ana").unwrap();
        assert!(!datos.es_entrenable());
        assert_eq!(datos.total_muestras(), 0);

        let _ = fs::remove_dir_all(&raiz);
    }

    #[test]
    fn test_perfil_sin_sesiones_no_es_entrenable() {
        let raiz = raiz_de_pruebas("vacio");
        let store = ProfileStore::new(&raiz);

        let datos = store.cargar_todas_las_sesiones("nuevo").unwrap();
        assert!(!datos.es_entrenable());

        let _ = fs::remove_dir_all(&raiz);
    }
}
