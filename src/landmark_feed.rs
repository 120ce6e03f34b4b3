use std::io::{self, BufRead};

use anyhow::{Context, Result};
use crossbeam_channel::Sender;

use crate::types::{Landmark, LandmarkFrame};

/// Mensaje del detector externo: un frame de landmarks, o `None` cuando
/// la detección falló en ese frame
pub type Deteccion = Option<LandmarkFrame>;

/// Lee la entrada estándar línea a línea y publica cada detección por
/// el canal. Pensado para correr en su propio hilo; termina al cerrarse
/// la entrada o el canal.
///
/// Protocolo por línea: `null` = sin detección, o un arreglo JSON de
/// ternas `[x, y, z]`. Las líneas en blanco se ignoran y las ilegibles
/// se descartan con un aviso.
pub fn iniciar_lector_stdin(tx: Sender<Deteccion>) -> Result<()> {
    let stdin = io::stdin();

    for (num_linea, linea) in stdin.lock().lines().enumerate() {
        let linea = linea.context("error leyendo la entrada del detector")?;
        let linea = linea.trim();
        if linea.is_empty() {
            continue;
        }

        match decodificar_linea(linea) {
            Ok(deteccion) => {
                if tx.send(deteccion).is_err() {
                    break;
                }
            }
            Err(e) => eprintln!("[AVISO] Línea {} descartada: {}", num_linea + 1, e),
        }
    }

    Ok(())
}

/// Decodifica una línea del protocolo. La aridad del frame no se valida
/// aquí: un frame con más o menos de 33 puntos lo degrada el extractor
/// de características al vector de ceros.
pub fn decodificar_linea(linea: &str) -> Result<Deteccion> {
    let puntos: Option<Vec<[f32; 3]>> =
        serde_json::from_str(linea).context("JSON de landmarks inválido")?;

    Ok(puntos.map(|puntos| puntos.into_iter().map(Landmark::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NUM_LANDMARKS;

    #[test]
    fn test_null_es_sin_deteccion() {
        assert_eq!(decodificar_linea("null").unwrap(), None);
    }

    #[test]
    fn test_frame_completo() {
        let triples: Vec<String> = (0..NUM_LANDMARKS)
            .map(|i| format!("[{}.5, 0.25, -0.1]", i))
            .collect();
        let linea = format!("[{}]", triples.join(","));

        let frame = decodificar_linea(&linea).unwrap().unwrap();
        assert_eq!(frame.len(), NUM_LANDMARKS);
        assert_eq!(frame[0], Landmark::new(0.5, 0.25, -0.1));
        assert_eq!(frame[32].x, 32.5);
    }

    #[test]
    fn test_json_invalido_es_error() {
        assert!(decodificar_linea("esto no es json").is_err());
        assert!(decodificar_linea("[[1.0, 2.0]]").is_err());
    }

    #[test]
    fn test_aridad_incorrecta_pasa_de_largo() {
        // La degradación a ceros ocurre en el extractor, no aquí
        let frame = decodificar_linea("[[0.1, 0.2, 0.3]]").unwrap().unwrap();
        assert_eq!(frame.len(), 1);
    }
}
