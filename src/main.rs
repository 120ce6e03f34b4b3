/*
Detector de Postura en Tiempo Real - Rust Puro

Sistema de vigilancia de postura que:
1. Recibe landmarks corporales del detector externo (una línea JSON por frame)
2. Entrena un clasificador por perfil con las sesiones guardadas
3. Suaviza las predicciones por voto mayoritario y acumula métricas de tiempo
4. Dispara una alarma interrumpible mientras la postura dominante sea mala

Para ejecutar:
    detector-externo | ./target/release/postura <perfil>

Protocolo de entrada: por línea, `null` (sin detección) o un arreglo JSON
de 33 ternas [x, y, z].
*/

use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, select, tick};

use postura::detector_session::DetectorSession;
use postura::landmark_feed::{iniciar_lector_stdin, Deteccion};
use postura::posture_classifier::{entrenar_en_segundo_plano, TrainError};
use postura::profile_store::{ProfileStore, DIR_PERFILES};
use postura::session_metrics::format_time;

struct Opciones {
    perfil: Option<String>,
    raiz: String,
    listar: bool,
}

fn parse_args() -> Result<Opciones> {
    let mut perfil: Option<String> = None;
    let mut raiz = DIR_PERFILES.to_string();
    let mut listar = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--listar" => listar = true,
            "--perfiles" => {
                raiz = args
                    .next()
                    .ok_or_else(|| anyhow!("--perfiles requiere un directorio"))?;
            }
            _ => {
                if perfil.is_some() {
                    bail!("Uso: postura [--perfiles <dir>] [--listar] <perfil>");
                }
                perfil = Some(arg);
            }
        }
    }

    Ok(Opciones {
        perfil,
        raiz,
        listar,
    })
}

fn main() -> Result<()> {
    println!("🧍 Detector de Postura de Uso Diario\n");

    let opciones = parse_args()?;
    let store = ProfileStore::new(&opciones.raiz);

    if opciones.listar {
        let perfiles = store.listar_perfiles();
        if perfiles.is_empty() {
            println!("No hay perfiles en {:?}.", store.raiz());
        } else {
            for perfil in perfiles {
                println!("{}", perfil);
            }
        }
        return Ok(());
    }

    let perfil = match opciones.perfil {
        Some(perfil) => perfil,
        None => bail!("Uso: postura [--perfiles <dir>] [--listar] <perfil>"),
    };

    let perfiles = store.listar_perfiles();
    if !perfiles.contains(&perfil) {
        eprintln!("❌ El perfil '{}' no existe.", perfil);
        if perfiles.is_empty() {
            eprintln!(
                "   No hay perfiles en {:?}. Graba una sesión con entrenar_sesion.",
                store.raiz()
            );
        } else {
            eprintln!("   Perfiles disponibles: {}", perfiles.join(", "));
        }
        std::process::exit(1);
    }

    println!("[INFO] Perfil seleccionado: {}", perfil);
    println!("[INFO] Cargando datos...");

    // Entrenamiento de una sola pasada en su propio hilo; la detección
    // no arranca hasta recibir su señal de término
    let rx_modelo = entrenar_en_segundo_plano(store.clone(), perfil.clone());
    let modelo = match rx_modelo
        .recv()
        .context("el hilo de entrenamiento terminó sin responder")?
    {
        Ok(modelo) => modelo,
        Err(TrainError::DatosInsuficientes) => {
            eprintln!("❌ No hay suficientes datos para entrenar.");
            eprintln!(
                "   Graba al menos una sesión con: entrenar_sesion {}",
                perfil
            );
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("falló el entrenamiento del modelo"),
    };

    println!(
        "[ML] Modelo listo (precisión de entrenamiento: {:.2})",
        modelo.precision_entrenamiento()
    );

    // Canal de frames del detector externo
    let (tx, rx) = bounded::<Deteccion>(100);
    thread::spawn(move || {
        if let Err(e) = iniciar_lector_stdin(tx) {
            eprintln!("❌ Error en la entrada del detector: {}", e);
        }
    });

    println!("🎬 Iniciando detección en tiempo real...\n");

    let mut sesion = DetectorSession::new(modelo);
    let informe = tick(Duration::from_secs(5));
    let mut ultimo_texto = "";

    loop {
        select! {
            recv(rx) -> msg => match msg {
                Ok(deteccion) => {
                    let feedback = sesion.procesar_frame(deteccion.as_deref());
                    if feedback.texto != ultimo_texto {
                        println!("[ESTADO] {}", feedback.texto);
                        ultimo_texto = feedback.texto;
                    }
                }
                // El detector cerró la entrada: fin de la sesión
                Err(_) => break,
            },
            recv(informe) -> _ => {
                let metricas = sesion.metricas();
                println!(
                    "[INFO] Buena postura: {}  |  Mala postura: {}",
                    format_time(metricas.tiempo_bueno()),
                    format_time(metricas.tiempo_malo())
                );
            }
        }
    }

    sesion.finalizar();

    let metricas = sesion.metricas();
    println!("\n📊 Resumen de la sesión");
    println!(
        "   Tiempo con BUENA postura: {}",
        format_time(metricas.tiempo_bueno())
    );
    println!(
        "   Tiempo con MALA postura:  {}",
        format_time(metricas.tiempo_malo())
    );

    Ok(())
}
