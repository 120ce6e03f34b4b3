use crate::types::{Landmark, FEATURE_LEN, NUM_LANDMARKS};

/// Extrae las 33 coordenadas x, y, z de los landmarks y las concatena en
/// un vector de 99 elementos (el vector de características para ML).
///
/// Si la detección falló o el frame no tiene exactamente `NUM_LANDMARKS`
/// puntos, devuelve el vector de ceros en lugar de un error: los
/// consumidores lo tratan como "sin señal útil" (ver [`tiene_senal`]).
pub fn extraer_features(landmarks: Option<&[Landmark]>) -> Vec<f32> {
    match landmarks {
        Some(puntos) if puntos.len() == NUM_LANDMARKS => {
            let mut features = Vec::with_capacity(FEATURE_LEN);
            for punto in puntos {
                features.push(punto.x);
                features.push(punto.y);
                features.push(punto.z);
            }
            features
        }
        _ => vec![0.0; FEATURE_LEN],
    }
}

/// Comprueba si un vector de características lleva señal útil.
///
/// El centinela de fallo es el vector todo-ceros; mirar solo la primera
/// componente basta y es lo que hace todo consumidor. Una detección real
/// con x=0.0 exacto en el primer landmark es indistinguible del fallo;
/// limitación asumida del formato.
pub fn tiene_senal(features: &[f32]) -> bool {
    features.first().map_or(false, |&x| x != 0.0)
}
