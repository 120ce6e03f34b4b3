use std::time::Instant;

use crate::alarm::AlarmScheduler;
use crate::feature_extractor::{extraer_features, tiene_senal};
use crate::posture_classifier::PostureModel;
use crate::prediction_filter::PredictionFilter;
use crate::session_metrics::SessionMetrics;
use crate::types::{Landmark, PostureLabel, SmoothedLabel};

/// Color RGB para la capa de presentación externa
pub type ColorRgb = (u8, u8, u8);

/// Texto y color de retroalimentación para una etiqueta dominante
pub fn clasificar_postura(dominante: SmoothedLabel) -> (&'static str, ColorRgb) {
    match dominante {
        SmoothedLabel::Etiqueta(PostureLabel::Perfecto) => ("Postura Correcta", (0, 255, 0)),
        SmoothedLabel::Etiqueta(PostureLabel::Aceptable) => ("Zona de Alerta", (0, 165, 255)),
        SmoothedLabel::Etiqueta(PostureLabel::Malo) => ("Postura Incorrecta", (255, 0, 0)),
        SmoothedLabel::Buscando => ("Buscando...", (255, 255, 255)),
    }
}

/// Resultado de procesar un frame
#[derive(Debug, Clone, Copy)]
pub struct FrameFeedback {
    pub dominante: SmoothedLabel,
    pub texto: &'static str,
    pub color: ColorRgb,
}

/// Controlador de una sesión de detección: el modelo ajustado más todo
/// el estado por-frame (filtro, métricas y alarma).
///
/// `procesar_frame` es síncrono y nunca bloquea: la alarma corre en su
/// propio hilo y aquí solo se dispara o se suelta.
pub struct DetectorSession {
    modelo: PostureModel,
    filtro: PredictionFilter,
    metricas: SessionMetrics,
    alarma: AlarmScheduler,
    ultimo_frame: Instant,
}

impl DetectorSession {
    pub fn new(modelo: PostureModel) -> Self {
        Self::con_componentes(modelo, PredictionFilter::default(), AlarmScheduler::new())
    }

    pub fn con_componentes(
        modelo: PostureModel,
        filtro: PredictionFilter,
        alarma: AlarmScheduler,
    ) -> Self {
        Self {
            modelo,
            filtro,
            metricas: SessionMetrics::new(),
            alarma,
            ultimo_frame: Instant::now(),
        }
    }

    /// Procesa la detección de un frame: extracción, inferencia,
    /// suavizado, conteo de tiempo y alarma.
    ///
    /// Un frame sin detección o sin señal útil no toca métricas ni
    /// alarma; solo reporta `Buscando`. Recibir `None` indefinidamente
    /// es inocuo.
    pub fn procesar_frame(&mut self, deteccion: Option<&[Landmark]>) -> FrameFeedback {
        let ahora = Instant::now();
        let delta = ahora.duration_since(self.ultimo_frame).as_secs_f64();
        self.ultimo_frame = ahora;

        let mut dominante = SmoothedLabel::Buscando;

        if let Some(puntos) = deteccion {
            let caracteristicas = extraer_features(Some(puntos));

            if tiene_senal(&caracteristicas) {
                let prediccion = self.modelo.predecir(&caracteristicas);
                self.filtro.agregar(prediccion);
                dominante = self.filtro.dominante();

                self.metricas.acumular(dominante, delta);

                if dominante.es_mala() {
                    self.alarma.activar();
                } else {
                    self.alarma.detener();
                }
            }
        }

        let (texto, color) = clasificar_postura(dominante);
        FrameFeedback {
            dominante,
            texto,
            color,
        }
    }

    pub fn metricas(&self) -> &SessionMetrics {
        &self.metricas
    }

    pub fn alarma(&self) -> &AlarmScheduler {
        &self.alarma
    }

    /// Suelta la alarma al cerrar la sesión
    pub fn finalizar(&self) {
        self.alarma.detener();
    }
}
