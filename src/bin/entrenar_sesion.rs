use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, Receiver};

use postura::feature_extractor::{extraer_features, tiene_senal};
use postura::landmark_feed::{iniciar_lector_stdin, Deteccion};
use postura::profile_store::{ProfileStore, TrainingSession, DIR_PERFILES};

/// Segundos de captura por postura
const DURACION_CAPTURA: Duration = Duration::from_secs(10);

struct Opciones {
    perfil: String,
    raiz: String,
    duracion: Duration,
}

fn parse_args() -> Result<Opciones> {
    let mut perfil: Option<String> = None;
    let mut raiz = DIR_PERFILES.to_string();
    let mut duracion = DURACION_CAPTURA;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--perfiles" => {
                raiz = args
                    .next()
                    .ok_or_else(|| anyhow!("--perfiles requiere un directorio"))?;
            }
            "--duracion" => {
                let segundos: u64 = args
                    .next()
                    .ok_or_else(|| anyhow!("--duracion requiere un número de segundos"))?
                    .parse()
                    .context("--duracion debe ser un número de segundos")?;
                duracion = Duration::from_secs(segundos);
            }
            _ => {
                if perfil.is_some() {
                    bail!("Uso: entrenar_sesion [--perfiles <dir>] [--duracion <s>] <perfil>");
                }
                perfil = Some(arg);
            }
        }
    }

    let perfil =
        perfil.ok_or_else(|| anyhow!("Debes especificar el nombre del perfil a entrenar"))?;
    Ok(Opciones {
        perfil,
        raiz,
        duracion,
    })
}

fn main() -> Result<()> {
    println!("🏋️  Modo Entrenamiento: captura de sesión\n");

    let opciones = parse_args()?;
    let store = ProfileStore::new(&opciones.raiz);
    store.asegurar_perfil(&opciones.perfil)?;

    println!("[INFO] Perfil: {} (añadiendo datos)", opciones.perfil);

    let (tx, rx) = bounded::<Deteccion>(100);
    thread::spawn(move || {
        if let Err(e) = iniciar_lector_stdin(tx) {
            eprintln!("❌ Error en la entrada del detector: {}", e);
        }
    });

    println!(
        "-> Iniciando captura de PERFECTO ({} s). Mantén la postura correcta...",
        opciones.duracion.as_secs()
    );
    let perfecto = capturar_cubo(&rx, opciones.duracion);
    println!("   {} muestras capturadas", perfecto.len());

    println!(
        "-> Iniciando captura de MALO ({} s). Adopta la postura peligrosa...",
        opciones.duracion.as_secs()
    );
    let malo = capturar_cubo(&rx, opciones.duracion);
    println!("   {} muestras capturadas", malo.len());

    let sesion = TrainingSession { perfecto, malo };
    if !sesion.esta_completa() {
        bail!("No se capturaron suficientes datos. Intente de nuevo.");
    }

    let ruta = store.guardar_sesion(&opciones.perfil, &sesion)?;
    println!(
        "\n✅ Perfil '{}' entrenado con éxito: {:?}",
        opciones.perfil, ruta
    );

    Ok(())
}

/// Acumula vectores de características con señal útil hasta agotar la
/// duración de la etapa o quedarse sin entrada. Los frames sin señal no
/// cuentan como muestras.
fn capturar_cubo(rx: &Receiver<Deteccion>, duracion: Duration) -> Vec<Vec<f32>> {
    let fin = Instant::now() + duracion;
    let mut cubo = Vec::new();

    while let Some(restante) = fin.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(restante) {
            Ok(deteccion) => {
                let features = extraer_features(deteccion.as_deref());
                if tiene_senal(&features) {
                    cubo.push(features);
                }
            }
            // Se agotó la etapa o se cerró la entrada
            Err(_) => break,
        }
    }

    cubo
}
